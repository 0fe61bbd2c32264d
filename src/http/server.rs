//! HTTP server wiring: router construction, bind, and graceful
//! shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{AppError, Result};

use super::{installations, oauth, webhook, AppState};

/// Handler for `GET /health` — liveness plus publish counters.
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "publish": state.publisher.stats(),
    }))
}

/// Build the application router over shared state.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks/zendesk/{installation_id}", post(webhook::receive))
        .route("/auth/authorize", get(oauth::authorize))
        .route("/auth/token", post(oauth::token))
        .route(
            "/installations/{installation_id}/settings",
            put(installations::update_settings),
        )
        .route(
            "/installations/{installation_id}",
            delete(installations::uninstall),
        )
        .with_state(state)
}

/// Bind and serve until the cancellation token fires.
///
/// # Errors
///
/// Returns `AppError::Config` if the server fails to bind and
/// `AppError::Internal` if serving fails.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let port = state.config.http_port;
    let bind = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind http server on {bind}: {err}")))?;

    info!(%bind, "http server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Internal(format!("http server failed: {err}")))
}
