use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::{AppState, GIT_SHA, VERSION};

/// GET /health — liveness check, returns server metadata.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": VERSION,
        "git_sha": GIT_SHA,
        "mode": state.config.gateway.mode.as_str(),
        "connections": state.hub.connection_count(),
    }))
}
