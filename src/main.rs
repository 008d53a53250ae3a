//! Precinct - department roster server
//!
//! CLI entry point for the Precinct server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod middleware;
mod server;

/// Precinct roster server
#[derive(Debug, Parser)]
#[command(name = "precinct", version, about)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:8460")]
    bind: String,

    /// Path to the officer database (sqlite)
    #[arg(long, default_value = "data/officers.db")]
    database: String,

    /// Use the in-memory officer store instead of sqlite
    #[arg(long)]
    memory_store: bool,

    /// Disable authentication (development only)
    #[arg(long)]
    no_auth: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "precinct=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Starting Precinct roster server v{}", env!("CARGO_PKG_VERSION"));

    server::run(server::ServerOptions {
        bind: cli.bind,
        database: cli.database,
        memory_store: cli.memory_store,
        auth_enabled: !cli.no_auth,
    })
    .await
}
