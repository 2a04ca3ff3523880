//! Duel - two-player tic-tac-toe over WebSockets.
//!
//! # Architecture
//!
//! - **Session**: the match state machine (seats, turns, results)
//! - **Actor**: a single task that owns the session and applies commands in order
//! - **Protocol**: JSON envelopes exchanged with browser clients
//! - **Gateway**: axum WebSocket handler bridging sockets and the actor
//!
//! # Example
//!
//! ```no_run
//! use duel_server::{ServerConfig, create_app};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let (app, _session) = create_app(ServerConfig::default());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:4000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

pub mod actor;
pub mod config;
pub mod gateway;
pub mod player;
pub mod protocol;
pub mod router;
pub mod session;
pub mod state;

pub use actor::{SessionActor, SessionClosed, SessionCommand, SessionHandle, spawn_session};
pub use config::{ConfigError, ServerConfig};
pub use player::{ChannelSink, ConnectionId, Player, PlayerSink, Seat, SinkError};
pub use protocol::{ClientCommand, ProtocolError, ServerEvent, Snapshot};
pub use router::{create_app, create_router};
pub use session::{MoveOutcome, Session, SessionError, SessionOptions, Status};
pub use state::AppState;
