//! HTTP and WebSocket API
//!
//! - `POST /api/pipeline/execute`, `GET /api/pipeline/status/:task_id`,
//!   `GET /api/pipeline/tasks`, `GET /api/pipeline/ws/:task_id`
//! - `GET /api/documents` (also `/api/documents/list`), `GET /api/documents/:step`,
//!   `GET /api/documents/:step/qa`, `GET|POST|DELETE /api/documents/:step/feedback`
//! - `GET /api/health`

pub mod documents;
pub mod dto;
pub mod error;
pub mod pipeline;
pub mod websocket;

#[cfg(test)]
mod testing;

pub use error::{ApiError, ApiResult};

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use dto::HealthResponse;
use pipeline_application::PipelineService;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PipelineService>,
}

impl AppState {
    pub fn new(service: PipelineService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .nest("/api/pipeline", pipeline::pipeline_routes())
        .nest("/api/documents", documents::document_routes())
        .with_state(state)
}

/// Serve the API on `bind` until Ctrl-C
pub async fn serve(state: AppState, bind: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!(address = %listener.local_addr()?, "API server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Shutting down API server");
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tasks: state.service.tasks().len(),
    })
}
