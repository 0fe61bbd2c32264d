//! OAuth-style installation handshake endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::auth::tokens::{GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN};
use crate::AppError;

use super::AppState;

/// Query parameters for `GET /auth/authorize`.
#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    /// Caller-supplied opaque state, round-tripped for CSRF checking.
    #[serde(default)]
    pub state: Option<String>,
    /// Helpdesk account subdomain.
    #[serde(default)]
    pub subdomain: Option<String>,
    /// Authorizing user identifier.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Marketplace app identifier.
    #[serde(default)]
    pub app_id: Option<String>,
    /// Optional callback the code is delivered to via redirect.
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

/// Body for `POST /auth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Grant type literal (`authorization_code` or `refresh_token`).
    #[serde(default)]
    pub grant_type: Option<String>,
    /// Authorization code, required for the code grant.
    #[serde(default)]
    pub code: Option<String>,
    /// Refresh token, required for the refresh grant.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Handle `GET /auth/authorize`.
///
/// Issues a short-lived authorization code for the presented triple and
/// either redirects to the caller's callback or returns the code as
/// JSON when no `redirect_uri` is supplied.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let mut missing = Vec::new();
    let caller_state = params.state.as_deref().unwrap_or_default();
    let subdomain = params.subdomain.as_deref().unwrap_or_default();
    let user_id = params.user_id.as_deref().unwrap_or_default();
    let app_id = params.app_id.as_deref().unwrap_or_default();

    if caller_state.is_empty() {
        missing.push("state");
    }
    if subdomain.is_empty() {
        missing.push("subdomain");
    }
    if user_id.is_empty() {
        missing.push("user_id");
    }
    if app_id.is_empty() {
        missing.push("app_id");
    }
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": format!("missing required fields: {}", missing.join(", ")),
                "required": missing,
            })),
        )
            .into_response();
    }

    let code = match state
        .tokens
        .issue_authorization_code(subdomain, user_id, app_id, caller_state)
    {
        Ok(code) => code,
        Err(err) => return err.into_response(),
    };

    info!(subdomain, "authorization code issued");

    match params.redirect_uri.as_deref().filter(|u| !u.is_empty()) {
        Some(redirect_uri) => {
            let Ok(mut url) = Url::parse(redirect_uri) else {
                return AppError::Validation("redirect_uri is not a valid url".into())
                    .into_response();
            };
            url.query_pairs_mut()
                .append_pair("code", &code)
                .append_pair("state", caller_state);
            (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
        }
        None => (
            StatusCode::OK,
            Json(json!({ "code": code, "state": caller_state })),
        )
            .into_response(),
    }
}

/// Handle `POST /auth/token`.
///
/// Supports the authorization-code grant (installation creation / token
/// rotation) and the refresh-token grant (access token rotation).
pub async fn token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenRequest>,
) -> Response {
    let result = match request.grant_type.as_deref() {
        Some(GRANT_AUTHORIZATION_CODE) => match request.code.as_deref() {
            Some(code) if !code.is_empty() => {
                state.tokens.exchange_code(code, GRANT_AUTHORIZATION_CODE).await
            }
            _ => Err(AppError::InvalidRequest("code is required".into())),
        },
        Some(GRANT_REFRESH_TOKEN) => match request.refresh_token.as_deref() {
            Some(refresh) if !refresh.is_empty() => state.tokens.refresh_grant(refresh).await,
            _ => Err(AppError::InvalidRequest("refresh_token is required".into())),
        },
        Some(other) => Err(AppError::InvalidRequest(format!(
            "unsupported grant_type: {other}"
        ))),
        None => Err(AppError::InvalidRequest("grant_type is required".into())),
    };

    match result {
        Ok(grant) => (StatusCode::OK, Json(grant)).into_response(),
        Err(err) => err.into_response(),
    }
}
