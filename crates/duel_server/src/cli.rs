//! Command-line interface for the duel server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Duel - two-player tic-tac-toe over WebSockets
#[derive(Parser, Debug)]
#[command(name = "duel")]
#[command(about = "Two-player tic-tac-toe session server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket game server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tell players why their move was rejected
        #[arg(long)]
        echo_rejections: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
