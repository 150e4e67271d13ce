//! Architecture hyperparameters (`config.json`).
//!
//! Older checkpoints ship without a `config.json`; [`ArchConfig::default`]
//! then stands in with the F5TTS v1 Base values.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// DiT backbone hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchConfig {
    pub dim: u32,
    pub depth: u32,
    pub heads: u32,
    pub ff_mult: u32,
    pub text_dim: u32,
    pub conv_layers: u32,
}

impl Default for ArchConfig {
    fn default() -> Self {
        Self {
            dim: 1024,
            depth: 22,
            heads: 16,
            ff_mult: 2,
            text_dim: 512,
            conv_layers: 4,
        }
    }
}

/// Accepted `config.json` layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Nested { model: ArchSection },
    Section(ArchSection),
    Flat(ArchConfig),
}

#[derive(Deserialize)]
struct ArchSection {
    arch: ArchConfig,
}

impl ArchConfig {
    /// Parse a `config.json` body: flat, `{"arch": ..}` or `{"model": {"arch": ..}}`.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let file: ConfigFile = serde_json::from_slice(bytes)
            .context("config.json does not contain dim/depth/heads/ff_mult/text_dim/conv_layers")?;
        Ok(match file {
            ConfigFile::Nested { model } => model.arch,
            ConfigFile::Section(section) => section.arch,
            ConfigFile::Flat(arch) => arch,
        })
    }

    /// Read `path`, or fall back to the default when `path` is `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let bytes = std::fs::read(path)
            .with_context(|| format!("Cannot read config: {}", path.display()))?;
        Self::from_json(&bytes).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
