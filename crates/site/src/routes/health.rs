//! Health check endpoints.

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Ready once content is loaded and the upload directory accepts writes.
/// Returns 503 Service Unavailable otherwise.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.content().site().name.is_empty() {
        tracing::warn!("Readiness: site content not loaded");
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    match upload_dir_writable(&state).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness: upload directory not writable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn upload_dir_writable(state: &AppState) -> std::io::Result<()> {
    let root = state.blobs().root();
    tokio::fs::create_dir_all(root).await?;
    let probe = root.join(format!(".ready-{}", uuid::Uuid::new_v4()));
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}
