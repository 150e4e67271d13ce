//! Download the F5-TTS checkpoint into `<LOCAL_MODELS_DIR>/<HF_SUBDIR>/`.
//!
//! Usage:
//!   f5tts-provision
//!   HF_SUBDIR=F5TTS_v1_Base_v2 LOCAL_MODELS_DIR=./models f5tts-provision
//!   f5tts-provision --models-dir ./models --no-scoped-fetch
//!
//! Exits 0 when the model was already present or has been provisioned, and
//! non-zero when the download failed.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use f5tts::{
    config::{FallbackSpec, ProvisionConfig},
    fetch::HubFetcher,
    resolver::{self, Acquisition},
};

/// Flags override the corresponding environment variables.  The access token
/// is only read from `HUGGINGFACE_HUB_TOKEN`.
#[derive(Parser, Debug)]
#[command(name = "f5tts-provision", version, about)]
struct Args {
    /// Source repository [env: HF_REPO]
    #[arg(long)]
    repo: Option<String>,

    /// Subfolder to provision [env: HF_SUBDIR]
    #[arg(long)]
    subdir: Option<String>,

    /// Destination root [env: LOCAL_MODELS_DIR]
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Repository for missing vocab.txt / config.json [env: HF_FALLBACK_REPO]
    #[arg(long)]
    fallback_repo: Option<String>,

    /// Subfolder inside the fallback repository [env: HF_FALLBACK_SUBDIR]
    #[arg(long)]
    fallback_subdir: Option<String>,

    /// Always download the whole repository [env: HF_DISABLE_SCOPED_FETCH]
    #[arg(long)]
    no_scoped_fetch: bool,
}

impl Args {
    fn into_config(self) -> ProvisionConfig {
        let mut config = ProvisionConfig::from_env();
        if let Some(repo) = self.repo {
            config.remote.repo_id = repo;
        }
        if let Some(subdir) = self.subdir {
            config = config.with_subfolder(&subdir);
        }
        if let Some(dir) = self.models_dir {
            config = config.with_models_dir(&dir);
        }
        config.fallback = FallbackSpec {
            repo_id: self.fallback_repo.unwrap_or(config.fallback.repo_id),
            subfolder: self.fallback_subdir.unwrap_or(config.fallback.subfolder),
        };
        config.disable_scoped_fetch |= self.no_scoped_fetch;
        config
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Args::parse().into_config();

    println!("Repository : {}", config.remote.repo_id);
    println!("Subfolder  : {}", config.remote.subfolder);
    println!("Destination: {}", config.destination.dir().display());
    println!();

    let fetcher = HubFetcher::new(config.remote.token.clone())?
        .with_scoped_fetch(!config.disable_scoped_fetch);
    let report = resolver::provision(&fetcher, &config)?;

    match &report.acquisition {
        Acquisition::AlreadyPresent => println!(
            "Model already exists at {}",
            config.destination.dir().display()
        ),
        Acquisition::Scoped => println!(
            "Model downloaded to {}",
            config.destination.dir().display()
        ),
        Acquisition::WholeRepository { reason } => println!(
            "Model moved to {} (whole-repository download: {reason})",
            config.destination.dir().display()
        ),
    }
    for warning in &report.warnings {
        eprintln!("WARNING: {warning}");
    }
    println!("{}", report.readiness);
    Ok(())
}
