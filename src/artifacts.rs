//! The files that make up a provisioned model and the readiness summary.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::model_config::ArchConfig;

/// Recognised checkpoint names, most preferred first.
pub const WEIGHTS_CANDIDATES: [&str; 2] = ["model_last_inference.safetensors", "model_last.pt"];

/// Extension of the inference graph exported next to a checkpoint:
/// `model_last.pt` is served from `model_last.onnx`.
pub const GRAPH_EXTENSION: &str = "onnx";

pub const VOCAB_FILE: &str = "vocab.txt";
pub const CONFIG_FILE: &str = "config.json";

/// Files found in a model directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    pub weights: Option<PathBuf>,
    /// ONNX export of `weights`, when one sits next to it.
    pub graph: Option<PathBuf>,
    pub vocab: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl ArtifactSet {
    pub fn scan(dir: &Path) -> Self {
        let present = |name: &str| Some(dir.join(name)).filter(|p| p.is_file());
        let weights = WEIGHTS_CANDIDATES.iter().find_map(|name| present(*name));
        let graph = weights
            .as_deref()
            .map(graph_path)
            .filter(|p| p.is_file());
        Self {
            weights,
            graph,
            vocab: present(VOCAB_FILE),
            config: present(CONFIG_FILE),
        }
    }

    pub fn readiness(dir: &Path) -> Readiness {
        let set = Self::scan(dir);
        match set.weights {
            Some(weights) => Readiness::Ready {
                weights,
                graph: set.graph,
                vocab: set.vocab,
                config: set.config,
            },
            None => {
                let mut entries: Vec<String> = std::fs::read_dir(dir)
                    .map(|rd| {
                        rd.filter_map(|e| e.ok())
                            .map(|e| e.file_name().to_string_lossy().into_owned())
                            .collect()
                    })
                    .unwrap_or_default();
                entries.sort();
                Readiness::MissingCheckpoint {
                    dir: dir.to_path_buf(),
                    entries,
                }
            }
        }
    }
}

/// Where the inference graph for `weights` is expected.
pub fn graph_path(weights: &Path) -> PathBuf {
    weights.with_extension(GRAPH_EXTENSION)
}

/// Outcome of the final check on a model directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready {
        weights: PathBuf,
        graph: Option<PathBuf>,
        vocab: Option<PathBuf>,
        config: Option<PathBuf>,
    },
    /// Neither recognised checkpoint exists; `entries` lists what does.
    MissingCheckpoint { dir: PathBuf, entries: Vec<String> },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready {
                weights,
                graph,
                vocab,
                config,
            } => {
                writeln!(f, "Model ready.")?;
                writeln!(f, "  checkpoint : {}", weights.display())?;
                match graph {
                    Some(g) => writeln!(f, "  graph      : {}", g.display())?,
                    None => writeln!(
                        f,
                        "  graph      : not exported yet (expected {})",
                        graph_path(weights).display()
                    )?,
                }
                match vocab {
                    Some(v) => writeln!(f, "  vocab      : {}", v.display())?,
                    None => writeln!(f, "  vocab      : none required (byte-level tokenizer)")?,
                }
                match config {
                    Some(c) => write!(f, "  config     : {}", c.display()),
                    None => write!(f, "  config     : default {}", ArchConfig::default().to_json()),
                }
            }
            Self::MissingCheckpoint { dir, entries } => {
                writeln!(
                    f,
                    "WARNING: checkpoint missing: none of {} found in {}.",
                    WEIGHTS_CANDIDATES.join(", "),
                    dir.display()
                )?;
                write!(f, "  Inspect the directory contents: [{}]", entries.join(", "))
            }
        }
    }
}
