//! Health check endpoint.

use axum::routing::get;
use axum::{Json, Router};
use axum::extract::State;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health — liveness plus whether both scheduler triggers are healthy.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "birthday-herald-api",
        "version": env!("CARGO_PKG_VERSION"),
        "scheduler_running": state.scheduler.is_running(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
