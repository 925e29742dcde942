//! Command-line interface for parlor.

use clap::{Parser, Subcommand};

/// Parlor - turn-based multiplayer match server
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(about = "Lobby, session, and stats server for turn-based games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP match server
    Serve {
        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Path to the stats database file (created if it doesn't exist)
        #[arg(long, default_value = "parlor.db")]
        db_path: String,
    },
}
