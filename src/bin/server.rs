//! F5-TTS web UI: text in, speech out.
//!
//! Usage:
//!   f5tts-server
//!   f5tts-server --model-dir /models/F5TTS_v1_Base_v2 --onnx /srv/f5tts.onnx
//!
//! The model directory defaults to `<LOCAL_MODELS_DIR>/<HF_SUBDIR>`, the same
//! place `f5tts-provision` fills.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use f5tts::{
    config::ProvisionConfig,
    server::{self, AppState, PageInfo, DEFAULT_HOST, DEFAULT_PORT},
    OnnxSynthesizer,
};

#[derive(Parser, Debug)]
#[command(name = "f5tts-server", version, about)]
struct Args {
    /// Listen address
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Listen port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Provisioned model directory [default: $LOCAL_MODELS_DIR/$HF_SUBDIR]
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// ONNX graph [default: the checkpoint's export, e.g. model_last_inference.onnx]
    #[arg(long)]
    onnx: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "f5tts=info,f5tts_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let model_dir = args
        .model_dir
        .unwrap_or_else(|| ProvisionConfig::from_env().destination.dir());

    // Model loading is blocking and happens once, before binding.
    let synthesizer = OnnxSynthesizer::load(&model_dir, args.onnx.as_deref())?;
    info!(graph = %synthesizer.graph.display(), "model loaded");

    let state = AppState::new(Arc::new(synthesizer), PageInfo::default());
    let app = server::router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
