mod bot;
mod callback;
mod card;
mod config;
mod platform;
mod recorder;
mod store;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::platform::telegram::{self, TelegramMessenger};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,submission_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {} (plus environment)", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Manager chat: {}", config.telegram.manager_chat_id);
    info!("  Store: {}", config.store.path.display());
    info!("  Webhook path: {}", config.server.webhook_path);

    let bot = Bot::new(&config.telegram.bot_token);
    telegram::register(&bot, &config.telegram).await;

    let bind_address = config.server.bind_address.clone();
    let state = Arc::new(AppState::new(
        config,
        Arc::new(TelegramMessenger::new(bot)),
    ));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!("Webhook listening on {}", bind_address);

    axum::serve(listener, webhook::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Webhook server failed")?;

    Ok(())
}
