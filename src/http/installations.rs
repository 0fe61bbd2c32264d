//! Bearer-authenticated installation management: settings updates and
//! uninstall.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::info;

use crate::models::installation::{Installation, InstallationSettings};
use crate::AppError;

use super::AppState;

/// Resolve the bearer token in `Authorization` to its installation.
///
/// The token must verify *and* belong to the installation named in the
/// path — one installation's token grants nothing over another.
async fn authorize_bearer(
    state: &AppState,
    headers: &HeaderMap,
    installation_id: &str,
) -> Result<Installation, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("missing bearer token".into()))?;

    let installation = state
        .tokens
        .verify_access_token(token)
        .await
        .ok_or_else(|| AppError::Auth("token verification failed".into()))?;

    if installation.id != installation_id {
        return Err(AppError::Auth("token does not match installation".into()));
    }

    Ok(installation)
}

/// Handle `PUT /installations/{installation_id}/settings`.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Path(installation_id): Path<String>,
    headers: HeaderMap,
    Json(settings): Json<InstallationSettings>,
) -> Response {
    if let Err(err) = authorize_bearer(&state, &headers, &installation_id).await {
        return err.into_response();
    }

    match state.directory.update_settings(&installation_id, &settings).await {
        Ok(updated) => {
            info!(installation_id = %installation_id, "installation settings updated");
            (StatusCode::OK, Json(json!({ "settings": updated.settings }))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Handle `DELETE /installations/{installation_id}`.
///
/// Removal invalidates the webhook secret and both tokens atomically
/// with the record — a deleted installation's credentials fail
/// verification immediately.
pub async fn uninstall(
    State(state): State<Arc<AppState>>,
    Path(installation_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = authorize_bearer(&state, &headers, &installation_id).await {
        return err.into_response();
    }

    match state.directory.remove(&installation_id).await {
        Ok(()) => {
            info!(installation_id = %installation_id, "installation removed");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => err.into_response(),
    }
}
