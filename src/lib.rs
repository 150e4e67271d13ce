//! # f5tts
//!
//! Provisioning and serving for the [F5-TTS Russian] text-to-speech model.
//!
//! Two independent pieces:
//!
//! * **Provisioning** ([`resolver`]) makes sure
//!   `<LOCAL_MODELS_DIR>/<HF_SUBDIR>/` holds a checkpoint, `vocab.txt` and
//!   `config.json`, downloading from HuggingFace Hub when needed.  Run it once
//!   per deployment with the `f5tts-provision` binary.
//! * **Serving** ([`synth`], `server`) loads the provisioned model and
//!   answers synthesis requests from a small web page (`f5tts-server`, behind
//!   the `server` feature).
//!
//! ## Quick start
//!
//! ```no_run
//! use f5tts::{config::ProvisionConfig, fetch::HubFetcher, resolver};
//!
//! let config = ProvisionConfig::from_env();
//! let fetcher = HubFetcher::new(config.remote.token.clone()).unwrap();
//! let report = resolver::provision(&fetcher, &config).unwrap();
//! println!("{}", report.readiness);
//! ```
//!
//! [F5-TTS Russian]: https://huggingface.co/Misha24-10/F5-TTS_RUSSIAN

pub mod artifacts;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model_config;
pub mod relocate;
pub mod resolver;
pub mod synth;
pub mod tokenizer;

#[cfg(feature = "server")]
pub mod server;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use error::ProvisionError;
pub use resolver::{ensure_model_available, ProvisionReport};
pub use synth::{OnnxSynthesizer, Synthesis, Synthesizer, SAMPLE_RATE};
