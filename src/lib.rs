//! blastradius -- business impact analysis for infrastructure assets.
//!
//! Turns raw dependency records from the upstream graph service into
//! deduplicated impact sets, a severity level, an adjustable assurance score
//! and a structured incident narrative.

pub mod api;
pub mod assurance;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod impact;
pub mod narrative;
pub mod report;
pub mod simulation;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog::AssetCatalog;
use crate::client::UpstreamClient;
use crate::config::AppConfig;

/// Start the JSON API server in front of the upstream impact service.
pub async fn serve(config: &AppConfig, bind: &str) -> Result<()> {
    let client = UpstreamClient::new(&config.upstream).context("failed to build upstream client")?;
    let catalog = AssetCatalog::new(config.assets.clone());
    tracing::info!(upstream = %config.upstream.base_url, assets = catalog.len(), "Initializing API state");

    let state = api::state::AppState::new(Arc::new(client), catalog);
    let app = api::router(state, config.server.cors_allow_any);

    let addr: std::net::SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", bind))?;
    tracing::info!(%addr, "blastradius listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
