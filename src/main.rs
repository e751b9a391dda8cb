// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kakao Session Gateway API Server
//!
//! Logs users in with Kakao and manages their session token pairs.

use kakao_session_gateway::{
    config::Config,
    db::{RedisTokenStore, SqlUserDirectory},
    services::{KakaoClient, Reconciler, SessionTokens},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Kakao session gateway");

    let directory = SqlUserDirectory::connect(&config.database_url, config.external_timeout).await?;
    let token_store = RedisTokenStore::connect(&config.redis_url, config.external_timeout).await?;

    let reconciler = Reconciler::new(
        Arc::new(directory),
        Arc::new(token_store),
        SessionTokens::new(&config.tokens),
    )
    .with_strict_refresh_rotation(config.strict_refresh_rotation);

    let kakao = KakaoClient::new(
        config.kakao_client_id.clone(),
        config.kakao_redirect_uri.clone(),
        config.external_timeout,
    )?;

    let state = Arc::new(AppState {
        config: config.clone(),
        reconciler,
        identity_provider: Arc::new(kakao),
    });

    let app = kakao_session_gateway::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kakao_session_gateway=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
