//! MockLoc Server
//!
//! Hosts the simulation controller behind a REST API. If a previous
//! process was killed mid-route, the persisted run is resumed before
//! the API comes up.

use anyhow::Result;
use mockloc_platform::SimulatedPlatform;
use mockloc_server::{api, persist::JsonFileStore, sinks, state::AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting MockLoc Server");

    let platform = Arc::new(SimulatedPlatform::new());
    let store = Arc::new(JsonFileStore::new()?);
    let state = AppState::new(platform, store);

    // A restart with a snapshot present and no fresh start request
    // means the previous run was interrupted; pick it back up.
    if state.controller.resume_persisted().await {
        info!("Resumed interrupted route simulation");
    }

    // Start the fix forwarder in background
    tokio::spawn(sinks::run_forwarder(state.clone()));

    // Build the router
    let app = api::create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 9300));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
