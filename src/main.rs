//! HTTP server for the Facility Wage Engine.
//!
//! Environment:
//! - `WAGE_ENGINE_CONFIG`: configuration directory (default `./config/standard`)
//! - `WAGE_ENGINE_SESSIONS`: root of the CSV session exports (default `./sessions`)
//! - `WAGE_ENGINE_ADDR`: listen address (default `127.0.0.1:3000`)
//! - `RUST_LOG`: log filter (default `info`)

use std::env;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use wage_engine::api::{AppState, create_router};
use wage_engine::config::ConfigLoader;
use wage_engine::fetch::CsvSessionSource;
use wage_engine::ledger::InMemoryCarryoverStore;
use wage_engine::service::WageService;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config_dir = env_or("WAGE_ENGINE_CONFIG", "./config/standard");
    let sessions_dir = env_or("WAGE_ENGINE_SESSIONS", "./sessions");
    let addr = env_or("WAGE_ENGINE_ADDR", "127.0.0.1:3000");

    let config = ConfigLoader::load(&config_dir)?;
    info!(
        config_dir = %config_dir,
        program = %config.program().name,
        version = %config.program().version,
        tiers = config.config().tiers().len(),
        "Configuration loaded"
    );

    let service = WageService::new(
        Arc::new(config),
        Arc::new(CsvSessionSource::new(&sessions_dir)),
        Arc::new(InMemoryCarryoverStore::new()),
    );
    let router = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, sessions_dir = %sessions_dir, "Wage engine listening");
    axum::serve(listener, router).await?;

    Ok(())
}
