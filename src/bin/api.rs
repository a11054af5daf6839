use finance_tracker::{
    api::{start_server, ApiState},
    auth::StaticTokenVerifier,
    config::Config,
    store::InMemoryStore,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    let config = Config::from_env()?;

    let verifier = StaticTokenVerifier::from_entries(&config.auth_tokens)?;
    if verifier.is_empty() {
        warn!("⚠️  TRACKER_AUTH_TOKENS not set - every /api request will be rejected");
        warn!("📌 Format: token:uid[:role],token:uid[:role]");
    }

    info!("🚀 Finance Tracker - API Server");
    info!("📍 Address: {}", config.listen_addr());
    info!("🔑 Tokens loaded: {}", verifier.len());

    let state = ApiState::new(Arc::new(InMemoryStore::new()), Arc::new(verifier));

    info!("✅ Store initialized");
    info!("📡 Starting API server...");

    // Start API server
    start_server(state, &config).await?;

    Ok(())
}
