mod config;
mod errors;
mod interview;
mod llm_client;
mod retail;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::sessions::SessionStore;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Giftfinder API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_endpoint.clone(),
        config.retry,
    )
    .context("Failed to build Gemini client")?;
    info!(
        "LLM client initialized (model: {}, retries: {}, base delay: {}ms)",
        llm.model(),
        config.retry.retries,
        config.retry.base_delay.as_millis()
    );

    info!(
        "Interviews capped at {} questions ({:?}), language: {}",
        config.interview.max_questions, config.interview.question_cap, config.interview.language
    );
    let sessions = SessionStore::new(Arc::new(llm), config.interview.clone(), config.session_ttl);
    sessions.spawn_sweeper(config.session_sweep_interval());
    info!("Idle sessions expire after {}s", config.session_ttl.as_secs());

    let state = AppState {
        sessions,
        config: config.clone(),
    };

    // TODO: restrict CORS origins once the web client has a fixed host
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
