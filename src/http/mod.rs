//! HTTP surface: webhook ingress, OAuth handshake, installation
//! management, and the shared application state.

pub mod installations;
pub mod oauth;
pub mod server;
pub mod webhook;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::auth::tokens::TokenAuthority;
use crate::config::GlobalConfig;
use crate::directory::SharedDirectory;
use crate::persistence::db::Database;
use crate::publish::DomainEventPublisher;
use crate::AppError;

/// Shared application state constructed once at startup and injected
/// into every handler. All collaborators sit behind traits or shared
/// handles so tests can substitute doubles without global state.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// `SQLite` connection pool.
    pub db: Arc<Database>,
    /// Installation directory (read-mostly keyed store).
    pub directory: SharedDirectory,
    /// Token authority for the OAuth handshake and bearer verification.
    pub tokens: Arc<TokenAuthority>,
    /// Downstream domain event publisher.
    pub publisher: Arc<dyn DomainEventPublisher>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation_error", "message": msg }),
            ),
            Self::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_request", "error_description": msg }),
            ),
            Self::InvalidGrant(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_grant", "error_description": msg }),
            ),
            // Auth failures carry no detail about why verification failed.
            Self::Auth(_) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthorized" }),
            ),
            Self::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "message": msg }),
            ),
            Self::Db(_) | Self::Publish(_) | Self::Internal(_) | Self::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal_error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
