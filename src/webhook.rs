//! HTTP entrypoint: Telegram POSTs updates here.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    routing::any,
    Router,
};
use teloxide::types::Update;
use tracing::{debug, error};

use crate::bot::{self, AppState};
use crate::platform::telegram::incoming_from_update;

pub fn router(state: Arc<AppState>) -> Router {
    let path = state.config.server.webhook_path.clone();

    let mut router = Router::new().route("/", any(webhook));
    if path != "/" {
        router = router.route(&path, any(webhook));
    }
    router.with_state(state)
}

async fn webhook(
    method: Method,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if method != Method::POST {
        return (StatusCode::OK, "Bot running");
    }

    match process_update(&state, &body).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!("Failed to handle update: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "ERROR")
        }
    }
}

async fn process_update(state: &AppState, body: &[u8]) -> Result<()> {
    let update: Update = serde_json::from_slice(body).context("Invalid update payload")?;
    debug!("Update {:?}", update.id);

    match incoming_from_update(update) {
        Some(incoming) => bot::handle(state, incoming).await,
        None => {
            debug!("Ignoring unsupported update kind");
            Ok(())
        }
    }
}
