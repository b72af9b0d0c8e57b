// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_store::DashboardStore;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::postgrest_gateway::PostgrestGateway;
use crate::presentation::app_state::AppState;
use crate::presentation::routes::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_app_config()?;

    // Gateway (infrastructure layer)
    let gateway = Arc::new(PostgrestGateway::new(
        config.gateway.url,
        config.gateway.api_key,
        config.gateway.timeout_secs.map(Duration::from_secs),
    )?);

    // Store (application layer), primed in the background
    let store = Arc::new(DashboardStore::new(
        gateway.clone(),
        config.dashboard.default_filters(),
    ));
    let warmup = store.clone();
    tokio::spawn(async move {
        warmup.load_agents().await;
        let outcome = warmup.refresh().await;
        tracing::info!("Initial refresh: {:?}", outcome);
    });

    let state = Arc::new(AppState::new(gateway, store));

    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!("Starting callcenter-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;

    Ok(())
}
