use crate::commands::{ImageResolver, Invocation, OcrCommands, Reply};
use crate::config::Config;
use crate::credentials::StaticCredentials;
use crate::error::OcrError;
use crate::gateway::Gateway;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<OcrCommands>,
}

/// Command invocation forwarded by a chat host
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub user_id: String,
    /// Text typed after the command, searched for image links
    #[serde(default)]
    pub image: Option<String>,
    /// Only read by `ocr`
    #[serde(default)]
    pub detect_handwriting: bool,
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Image URLs the host found on the replied-to message
    #[serde(default)]
    pub reply_images: Vec<String>,
    /// Image URLs the host found in recent channel history, newest first
    #[serde(default)]
    pub history_images: Vec<String>,
}

/// Command response
#[derive(Serialize)]
pub struct CommandResponse {
    pub reply: Reply,
    pub processing_time_ms: u64,
}

/// Cooldown rejection
#[derive(Serialize)]
pub struct CooldownResponse {
    pub reply: Reply,
    pub retry_after_ms: u64,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub commands: Vec<String>,
    pub providers: Vec<String>,
    pub vision_configured: bool,
    pub cooldown_secs: u64,
}

/// Resolves images from the context the host sent along with the command
struct RequestImages {
    reply: Vec<String>,
    history: Vec<String>,
}

#[async_trait]
impl ImageResolver for RequestImages {
    async fn from_reply(&self, _invocation: &Invocation) -> Vec<String> {
        self.reply.clone()
    }

    async fn from_history(&self, _invocation: &Invocation) -> Vec<String> {
        self.history.clone()
    }
}

impl CommandRequest {
    fn into_parts(self) -> Result<(Invocation, RequestImages, bool), OcrError> {
        if self.user_id.trim().is_empty() {
            return Err(OcrError::InvalidRequest("user_id must not be empty".to_string()));
        }

        let reply_to = self
            .reply_to
            .or_else(|| (!self.reply_images.is_empty()).then(|| "reply".to_string()));

        let invocation = Invocation {
            user_id: self.user_id,
            image: self.image,
            reply_to,
        };
        let images = RequestImages {
            reply: self.reply_images,
            history: self.history_images,
        };

        Ok((invocation, images, self.detect_handwriting))
    }
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/commands/freeocr", post(handle_freeocr))
        .route("/commands/ocr", post(handle_ocr))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let credentials = Arc::new(StaticCredentials::with_google_vision(
        config.google_vision_api_key.clone(),
    ));
    let gateway = Arc::new(Gateway::new(config.gateway.clone(), credentials)?);
    let commands = OcrCommands::new(Arc::clone(&gateway), config.cooldown, config.page_length);

    let state = AppState {
        commands: Arc::new(commands),
    };
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(gateway) {
        Ok(gateway) => gateway.shutdown(),
        Err(_) => tracing::warn!("OCR gateway still referenced at shutdown"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Handle `freeocr` invocations
async fn handle_freeocr(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Response, OcrError> {
    let start = Instant::now();
    let Json(request) = payload.map_err(|e| OcrError::InvalidRequest(e.body_text()))?;
    let (invocation, images, _) = request.into_parts()?;

    let outcome = state.commands.freeocr(&invocation, &images).await;
    Ok(respond(outcome, start))
}

/// Handle `ocr` invocations
async fn handle_ocr(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Response, OcrError> {
    let start = Instant::now();
    let Json(request) = payload.map_err(|e| OcrError::InvalidRequest(e.body_text()))?;
    let (invocation, images, detect_handwriting) = request.into_parts()?;

    let outcome = state
        .commands
        .ocr(&invocation, detect_handwriting, &images)
        .await;
    Ok(respond(outcome, start))
}

fn respond(outcome: Result<Reply, crate::commands::OnCooldown>, start: Instant) -> Response {
    match outcome {
        Ok(reply) => Json(CommandResponse {
            reply,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
        .into_response(),
        Err(cooldown) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(CooldownResponse {
                reply: Reply::message(cooldown.message()),
                retry_after_ms: cooldown.retry_after.as_millis() as u64,
            }),
        )
            .into_response(),
    }
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    let gateway = state.commands.gateway();
    let config = gateway.config();

    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        commands: vec!["freeocr".to_string(), "ocr".to_string()],
        providers: vec![
            config.free_ocr_url.clone(),
            config.ocr_space_url.clone(),
            config.vision_url.clone(),
        ],
        vision_configured: gateway.has_vision_key().await,
        cooldown_secs: state.commands.cooldown().as_secs(),
    })
}
