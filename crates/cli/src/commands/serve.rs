//! Serve command handler.
//!
//! Exposes the pest knowledge operation to a web chat front end.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Args;
use pestkb_core::{config::AppConfig, AppError, AppResult};
use pestkb_knowledge::{AnswerResult, PestKnowledgeRequest, PestKnowledgeService};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Serve the question endpoint over HTTP
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9002", env = "PESTKB_BIND")]
    pub bind: SocketAddr,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let service = Arc::new(PestKnowledgeService::from_config(config)?);
        let app = create_router(service);

        let listener = tokio::net::TcpListener::bind(self.bind).await?;
        tracing::info!("Listening on {}", self.bind);

        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Routes: `POST /api/pest-knowledge` and `GET /health`.
pub fn create_router(service: Arc<PestKnowledgeService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/pest-knowledge", post(pest_knowledge_handler))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "pestkb" }))
}

async fn pest_knowledge_handler(
    State(service): State<Arc<PestKnowledgeService>>,
    payload: Result<Json<PestKnowledgeRequest>, JsonRejection>,
) -> Result<Json<AnswerResult>, ApiError> {
    let Json(request) = payload?;
    let answer = service.pest_knowledge_retrieval(request).await?;
    Ok(Json(answer))
}

/// `AppError` rendered as a JSON `{error}` body.
struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// A missing or malformed body is the caller's fault, same as an empty query.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
