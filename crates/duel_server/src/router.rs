//! HTTP routes.

use crate::actor::spawn_session;
use crate::config::ServerConfig;
use crate::gateway::ws_handler;
use crate::protocol::Snapshot;
use crate::session::Session;
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Builds the router over existing state.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/state", get(state_handler))
        .route("/health", get(health))
        .with_state(state)
}

/// Spawns the session task and returns a ready-to-serve router.
///
/// Must be called inside a tokio runtime.
pub fn create_app(config: ServerConfig) -> (Router, JoinHandle<Session>) {
    let session = Session::new(config.session_options());
    let (handle, task) = spawn_session(session, *config.command_buffer());
    info!(host = %config.host(), port = *config.port(), "Application state initialized");
    let state = Arc::new(AppState::new(handle, config));
    (create_router(state), task)
}

async fn health() -> &'static str {
    "ok"
}

/// Returns the current session snapshot as JSON.
async fn state_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, StatusCode> {
    state.session.snapshot().await.map(Json).map_err(|e| {
        error!(error = %e, "Snapshot request failed");
        StatusCode::SERVICE_UNAVAILABLE
    })
}
