//! skycast server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use skycast_client::{CascadingGeocoder, OpenWeatherClient, OpenWeatherConfig, OpenWeatherProvider};
use skycast_core::{AppConfig, CacheDb};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod handler;
mod orchestrator;
mod tools;

use orchestrator::ForecastOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    config.require_api_key()?;

    let client = OpenWeatherClient::new(OpenWeatherConfig::from(&config))?;
    let cache = CacheDb::open(&config.db_path).await?;

    tracing::info!(db_path = %config.db_path.display(), base_url = %config.base_url, "Starting skycast server on stdio transport");

    let orchestrator = ForecastOrchestrator::new(
        Arc::new(CascadingGeocoder::new(client.clone())),
        Arc::new(OpenWeatherProvider::new(client)),
        cache,
    );

    let handler = handler::SkycastServer::new(orchestrator);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
