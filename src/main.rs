mod agent;
mod config;
mod errors;
mod models;
mod routes;
mod service;

use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::GeminiClient;
use crate::config::{RelayConfig, API_KEY_VAR};
use crate::service::relay_service::RelayService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsroom_assistant=debug,tower_http=debug".into()),
        )
        .init();

    // ── Configuration ────────────────────────────────────────────────────────
    let config = Arc::new(RelayConfig::from_env());
    if config.api_key.is_none() {
        warn!("{API_KEY_VAR} is not set; every chat request will fail");
    }

    // ── Dependency wiring ────────────────────────────────────────────────────
    let http = reqwest::Client::builder().build()?;
    let agent = GeminiClient::new(http, config.clone());
    let relay = RelayService::new(agent);

    let app = routes::router(relay);

    // ── Listen ───────────────────────────────────────────────────────────────
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/ (model {})", config.model);

    axum::serve(listener, app).await?;
    Ok(())
}
