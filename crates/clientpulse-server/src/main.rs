//! ClientPulse Server entry point.

mod app;
mod config;

use clientpulse_db::DbManager;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("clientpulse=info".parse()?))
        .json()
        .init();

    tracing::info!("Starting ClientPulse server...");

    let config = ServerConfig::from_env()?;
    let manager = DbManager::connect(&config.db).await?;
    let service = app::report_service(&manager, config.service);

    tokio::signal::ctrl_c().await?;
    drop(service);

    tracing::info!("ClientPulse server stopped.");
    Ok(())
}
