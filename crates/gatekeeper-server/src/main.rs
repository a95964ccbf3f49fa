// crates/gatekeeper-server/src/main.rs
// ============================================================================
// Module: Gatekeeper Gate Server
// Description: Binary wiring the Gate's axum router to its real backends.
// Purpose: Serve the installer-facing Simple Index surface and the admin
//          read endpoints (§6) over HTTP.
// Dependencies: gatekeeper-gate, gatekeeper-config, gatekeeper-store-sqlite,
//               gatekeeper-upstream, axum, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! This binary loads [`GateConfig`] from the environment, opens the SQLite
//! catalog, builds an [`HttpIndexClient`] pointed at the internal index, and
//! serves [`gatekeeper_gate::handlers::router`] until the process receives a
//! shutdown signal. It carries no orchestration logic of its own; the Gate
//! only ever reads the catalog and never claims or finalizes a row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;
use std::sync::Arc;

use gatekeeper_config::GateConfig;
use gatekeeper_core::CatalogStore;
use gatekeeper_core::IndexClient;
use gatekeeper_gate::GateState;
use gatekeeper_gate::handlers::router;
use gatekeeper_store_sqlite::SqliteCatalogStore;
use gatekeeper_upstream::HttpIndexClient;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "gatekeeper-server exited with an error");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder().with_default_directive(tracing::Level::INFO.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).finish().try_init().ok();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = GateConfig::from_env()?;
    tracing::info!(bind_addr = %config.bind_addr, pypi_server_url = %config.pypi_server_url, "starting gatekeeper-server");

    let catalog: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::open(&config.database_url)?);
    let index: Arc<dyn IndexClient> = Arc::new(HttpIndexClient::new(config.pypi_server_url.clone())?);
    let state = GateState::new(catalog, index, config.problem_base_url.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "gatekeeper-server listening");
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::warn!(error = %err, "failed to install SIGTERM handler"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}
