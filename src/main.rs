//! Parlor - turn-based multiplayer match server.

mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use diesel::{Connection, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use parlor::{
    router, AppState, DevIdentity, EngineRegistry, LobbyService, MemoryStore, SessionService,
    StatsRepository, StatsService,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            host,
            db_path,
        } => serve(host, port, db_path).await,
    }
}

/// Runs the HTTP match server.
async fn serve(host: String, port: u16, db_path: String) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(db_path = %db_path, "Applying pending stats migrations");
    let mut conn = SqliteConnection::establish(&db_path)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("migrations failed: {e}"))?;

    let registry = Arc::new(EngineRegistry::standard());
    let store = Arc::new(MemoryStore::new());
    let stats = StatsService::new(StatsRepository::new(db_path));
    let lobbies = LobbyService::new(store.clone(), registry.clone());
    let sessions = SessionService::new(store, registry, lobbies.clone(), stats.clone());

    let state = AppState {
        lobbies,
        sessions,
        stats,
        identity: Arc::new(DevIdentity::new()),
    };

    let addr = format!("{host}:{port}");
    info!(addr = %addr, "Starting parlor server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
