//! Speech synthesis capability.
//!
//! [`Synthesizer`] is the opaque "text in, audio out" model the server
//! delegates to.  [`OnnxSynthesizer`] runs an exported F5-TTS graph with
//! [`ort`] (ONNX Runtime).  The graph is the export of the provisioned
//! checkpoint (`model_last_inference.onnx` for
//! `model_last_inference.safetensors`, see [`ArtifactSet`]):
//!
//! | Position | Name       | Shape         | dtype   |
//! |----------|------------|---------------|---------|
//! | input 0  | `text_ids` | `[1, seq_len]`| int64   |
//! | output 0 | waveform   | `[1, T]`/`[T]`| float32 |

use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Context, Result};
use ort::{session::Session, value::Tensor};
use serde::Serialize;
use tracing::info;

use crate::{
    artifacts::{graph_path, ArtifactSet},
    model_config::ArchConfig,
    tokenizer::TextTokenizer,
};

/// Audio sample rate produced by F5-TTS vocoders.
pub const SAMPLE_RATE: u32 = 24_000;

/// One synthesis result: mono samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Synthesis {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl Synthesis {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Encode as a 16-bit PCM mono WAV file.
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buf, spec).context("WAV header error")?;
            for &s in &self.samples {
                // f32 [-1.0, 1.0] → i16 [-32768, 32767].
                let s16 = (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                writer.write_sample(s16).context("WAV write error")?;
            }
            writer.finalize().context("WAV finalise error")?;
        }
        Ok(buf.into_inner())
    }
}

/// Opaque text-to-speech model.
///
/// Calls block for as long as the model needs; errors are returned as-is.
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, text: &str) -> Result<Synthesis>;

    /// Output sample rate.
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    /// Architecture of the loaded checkpoint, if known.
    fn arch(&self) -> Option<ArchConfig> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OnnxSynthesizer
// ─────────────────────────────────────────────────────────────────────────────

pub struct OnnxSynthesizer {
    session: Mutex<Session>,
    tokenizer: TextTokenizer,
    arch: ArchConfig,
    /// The ONNX graph the session was built from.
    pub graph: PathBuf,
}

impl OnnxSynthesizer {
    /// Load from a provisioned model directory.
    ///
    /// The graph is the export of the directory's checkpoint; `onnx_path`
    /// overrides it.  `vocab.txt` and `config.json` come from the same
    /// directory either way.
    pub fn load(model_dir: &Path, onnx_path: Option<&Path>) -> Result<Self> {
        let artifacts = ArtifactSet::scan(model_dir);
        let graph = select_graph(model_dir, &artifacts, onnx_path)?;

        let tokenizer = TextTokenizer::load(artifacts.vocab.as_deref())?;
        let arch = ArchConfig::load_or_default(artifacts.config.as_deref())?;

        info!(
            graph = %graph.display(),
            vocab_size = tokenizer.len(),
            "loading model"
        );
        let session = Session::builder()
            .context("Failed to create ORT session builder")?
            .commit_from_file(&graph)
            .with_context(|| format!("Cannot load ONNX model: {}", graph.display()))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            arch,
            graph,
        })
    }
}

/// `explicit`, or the export belonging to the checkpoint the provisioner
/// selected.
fn select_graph(
    model_dir: &Path,
    artifacts: &ArtifactSet,
    explicit: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let weights = artifacts.weights.as_deref().with_context(|| {
        format!(
            "No checkpoint in {}; run f5tts-provision first",
            model_dir.display()
        )
    })?;
    artifacts.graph.clone().with_context(|| {
        format!(
            "No ONNX export of {}: expected {}",
            weights.display(),
            graph_path(weights).display()
        )
    })
}

impl Synthesizer for OnnxSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Synthesis> {
        let ids = self.tokenizer.encode(text);
        let seq_len = ids.len();

        let t_text_ids = Tensor::<i64>::from_array(([1usize, seq_len], ids))
            .context("Failed to build text_ids tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ORT session mutex poisoned"))?;
        let outputs = session
            .run(ort::inputs![t_text_ids])
            .context("ONNX inference failed")?;

        let (_shape, audio) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract audio tensor")?;

        Ok(Synthesis {
            sample_rate: SAMPLE_RATE,
            samples: audio.to_vec(),
        })
    }

    fn arch(&self) -> Option<ArchConfig> {
        Some(self.arch)
    }
}
