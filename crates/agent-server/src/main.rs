//! crypto-assistant HTTP Server
//!
//! Axum front door for the turn graph: one POST per user message, plus
//! health and session inspection endpoints.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::GroqProvider;
use crypto_assistant::{CoinGeckoClient, GraphConfig, MarketData, TurnGraph};

use crate::handlers::{chat_handler, health_check, session_snapshot};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Completion service
    let provider = Arc::new(GroqProvider::from_env()?);
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to Groq"),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ Groq not reachable - turns will end with a diagnostic message");
            tracing::warn!("  Set GROQ_API_KEY in .env");
        }
    }

    // Market data
    let market = MarketData::new(Arc::new(CoinGeckoClient::from_env()));

    let config = GraphConfig::from_env()?;
    tracing::info!(model = %config.generation.model, max_steps = config.max_steps, "Turn graph configured");

    let graph = TurnGraph::builder()
        .provider(provider)
        .market(market)
        .config(config)
        .build()?;

    let app = router(AppState {
        graph: Arc::new(graph),
    });

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto-assistant running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  POST /api/chat           - Send message");
    tracing::info!("  GET  /api/sessions/{{id}} - Latest session checkpoint");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route("/api/sessions/{id}", get(session_snapshot))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
