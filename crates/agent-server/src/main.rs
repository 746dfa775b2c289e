//! crypto-agent HTTP Server
//!
//! Axum server backing the browser chat UI: a JSON chat API with
//! per-session transcripts and price charts, plus the static front end.

mod handlers;
mod session;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::TogetherProvider;
use crypto_agent::{
    AgentConfig, CoinGeckoClient, PriceCache, Settings, config::DEFAULT_CONFIG_PATH,
};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let settings = Settings::load(&config_path)?;
    tracing::info!(
        path = %config_path,
        cache_secs = settings.cache_duration.as_secs_f64(),
        rate_limit_secs = settings.rate_limit_delay.as_secs_f64(),
        "Loaded settings"
    );

    // Initialize LLM provider
    let provider = TogetherProvider::from_env().context("Together AI provider")?;
    let model = provider.model().to_string();
    match provider.health_check().await {
        Ok(true) => tracing::info!(model = %model, "✓ Connected to Together AI"),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Together AI not reachable - chat replies will carry the error");
        }
    }

    let prices = Arc::new(PriceCache::new(Arc::new(CoinGeckoClient::new()?)));
    let state = AppState::new(Arc::new(provider), prices, AgentConfig::new(model, settings));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into());
    let app = handlers::router(state)
        .fallback_service(ServeDir::new(&static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto-agent server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                     - Health check");
    tracing::info!("  POST /api/chat                   - Send message");
    tracing::info!("  GET  /api/sessions/{{id}}/messages - Transcript");
    tracing::info!("  GET  /api/sessions/{{id}}/prices   - Quoted prices (24h)");
    tracing::info!("  POST /api/sessions/{{id}}/reset    - Clear session");
    tracing::info!("  Static files from {}", static_dir);

    axum::serve(listener, app).await?;

    Ok(())
}
