//! Server bootstrap
//!
//! Wires the auth store, the officer store and the roster manager into an
//! axum router and runs it. The router builder is shared with the
//! integration tests so they exercise the same middleware stack.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use precinct_core::{
    AuthStore, Capability, MemoryOfficerStore, OfficerStore, RosterManager, SqliteOfficerStore,
};

use crate::api;

/// Runtime options resolved from the CLI
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Bind address
    pub bind: String,
    /// Sqlite database path
    pub database: String,
    /// Use the in-memory store instead of sqlite
    pub memory_store: bool,
    /// Whether authentication is enforced
    pub auth_enabled: bool,
}

/// Build the full application router over the given stores
pub fn build_router(auth_store: Arc<AuthStore>, manager: Arc<RosterManager>) -> Router {
    api::api_router()
        .merge(api::health_routes())
        .layer(Extension(auth_store))
        .layer(Extension(manager))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the server until interrupted
pub async fn run(options: ServerOptions) -> Result<()> {
    let store: Arc<dyn OfficerStore> = if options.memory_store {
        warn!("using the in-memory officer store; records will not survive a restart");
        Arc::new(MemoryOfficerStore::new())
    } else {
        Arc::new(
            SqliteOfficerStore::new(&options.database)
                .await
                .context("failed to open officer database")?,
        )
    };

    let auth_store = Arc::new(AuthStore::new(options.auth_enabled));
    if options.auth_enabled {
        // Bootstrap credential for first-run setup; shown once in the log.
        let (key, _hash) = auth_store
            .generate_key("bootstrap", vec![Capability::HighCommand], "bootstrap high command")
            .context("failed to generate bootstrap key")?;
        info!(key = %key, "bootstrap high-command key (store it now; it is not shown again)");
    } else {
        warn!("authentication disabled; every caller is anonymous high command");
    }

    let manager = Arc::new(RosterManager::new(store));
    let app = build_router(auth_store, manager);

    let listener = tokio::net::TcpListener::bind(&options.bind)
        .await
        .with_context(|| format!("failed to bind {}", options.bind))?;
    info!(addr = %options.bind, "precinct listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
