//! Shared application state handed to every axum handler.

use crate::actor::SessionHandle;
use crate::config::ServerConfig;
use crate::player::ConnectionId;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Created once at startup and cloned into handlers behind an `Arc`.
#[derive(Debug)]
pub struct AppState {
    /// Queue into the session task.
    pub session: SessionHandle,
    /// Effective configuration.
    pub config: Arc<ServerConfig>,
    next_connection: AtomicU64,
}

impl AppState {
    /// Bundles the session handle and configuration.
    pub fn new(session: SessionHandle, config: ServerConfig) -> Self {
        Self {
            session,
            config: Arc::new(config),
            next_connection: AtomicU64::new(1),
        }
    }

    /// Allocates the id for a newly accepted connection.
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::from(self.next_connection.fetch_add(1, Ordering::Relaxed))
    }
}
