use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub media_root: String,
    pub writable: bool,
    /// Destination subtrees files can be routed to
    pub subtrees: Vec<String>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let root = &state.config.media_root;
    let writable = match tokio::fs::metadata(root).await {
        Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
        Err(e) => {
            tracing::warn!("Media root {} is not accessible: {}", root.display(), e);
            false
        }
    };

    Json(HealthResponse {
        status: if writable { "ok" } else { "degraded" }.to_string(),
        media_root: root.display().to_string(),
        writable,
        subtrees: state
            .engine
            .registry()
            .roots()
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
