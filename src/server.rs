//! Web UI and HTTP API around a [`Synthesizer`].
//!
//! | Method | Path                   | Response                              |
//! |--------|------------------------|---------------------------------------|
//! | GET    | `/`                    | HTML page (title, description, form)  |
//! | GET    | `/api/info`            | JSON page metadata and model info     |
//! | POST   | `/api/synthesize`      | `audio/wav`, `x-sample-rate` header   |
//! | POST   | `/api/synthesize/raw`  | JSON `{"sample_rate", "samples"}`     |
//! | GET    | `/health`              | `ok`                                  |
//!
//! Synthesis runs on the blocking thread pool.  Model errors are returned as
//! HTTP 500 with the error chain as message, unchanged.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    model_config::ArchConfig,
    synth::{Synthesis, Synthesizer},
};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_TITLE: &str = "F5-TTS Russian";
pub const DEFAULT_DESCRIPTION: &str = "Синтез русской речи с помощью модели F5-TTS_RUSSIAN";

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

/// Static metadata shown on the page.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub title: String,
    pub description: String,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub synthesizer: Arc<dyn Synthesizer>,
    pub page: Arc<PageInfo>,
}

impl AppState {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, page: PageInfo) -> Self {
        Self {
            synthesizer,
            page: Arc::new(page),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": { "message": self.message } }));
        (self.status, body).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/api/info", get(info_handler))
        .route("/api/synthesize", post(synthesize_wav))
        .route("/api/synthesize/raw", post(synthesize_raw))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.page))
}

async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let arch: Option<ArchConfig> = state.synthesizer.arch();
    Json(json!({
        "title": state.page.title,
        "description": state.page.description,
        "sample_rate": state.synthesizer.sample_rate(),
        "arch": arch,
    }))
}

async fn synthesize_wav(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Response, ApiError> {
    let out = run_synthesis(&state, req.text).await?;
    let wav = out.to_wav().map_err(|e| ApiError::internal(format!("{e:#}")))?;

    let mut response = (StatusCode::OK, wav).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    headers.insert("x-sample-rate", HeaderValue::from(out.sample_rate));
    Ok(response)
}

async fn synthesize_raw(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Json<Synthesis>, ApiError> {
    run_synthesis(&state, req.text).await.map(Json)
}

async fn run_synthesis(state: &AppState, text: String) -> Result<Synthesis, ApiError> {
    let synthesizer = Arc::clone(&state.synthesizer);
    let chars = text.chars().count();

    let result = tokio::task::spawn_blocking(move || synthesizer.synthesize(&text))
        .await
        .map_err(|e| ApiError::internal(format!("synthesis task failed: {e}")))?;

    match result {
        Ok(out) => {
            info!(
                chars,
                samples = out.samples.len(),
                secs = out.duration_secs(),
                "synthesized"
            );
            Ok(out)
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "synthesis failed");
            Err(ApiError::internal(format!("{e:#}")))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Page
// ─────────────────────────────────────────────────────────────────────────────

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_page(page: &PageInfo) -> String {
    let title = escape_html(&page.title);
    let description = escape_html(&page.description);
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }}
textarea {{ width: 100%; min-height: 6rem; }}
#error {{ color: #b00; white-space: pre-wrap; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{description}</p>
<textarea id="text"></textarea>
<p><button id="go">Submit</button></p>
<audio id="audio" controls></audio>
<div id="error"></div>
<script>
document.getElementById("go").onclick = async () => {{
  const err = document.getElementById("error");
  err.textContent = "";
  const res = await fetch("/api/synthesize", {{
    method: "POST",
    headers: {{ "content-type": "application/json" }},
    body: JSON.stringify({{ text: document.getElementById("text").value }}),
  }});
  if (!res.ok) {{
    const body = await res.json().catch(() => ({{}}));
    err.textContent = (body.error && body.error.message) || res.statusText;
    return;
  }}
  const blob = await res.blob();
  const audio = document.getElementById("audio");
  audio.src = URL.createObjectURL(blob);
  audio.play();
}};
</script>
</body>
</html>
"#
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
