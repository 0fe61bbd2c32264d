//! Webhook ingress — the composition point for signature verification,
//! classification, synchronization, and publishing.
//!
//! The acknowledgment contract: once an event has been classified, the
//! response is 200 with the event id and type, regardless of storage or
//! broker outcomes. Failing the webhook instead would make the platform
//! retry-storm the same event against a possibly-still-broken
//! dependency without preserving any additional information.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::signature;
use crate::classifier::{self, EnvelopeError};
use crate::models::event::WebhookEvent;
use crate::models::installation::Installation;
use crate::sync::ConversationSynchronizer;

use super::AppState;

/// Header carrying the base64 HMAC-SHA256 body signature.
pub const SIGNATURE_HEADER: &str = "X-Zendesk-Webhook-Signature";

/// Handle `POST /webhooks/zendesk/{installation_id}`.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    Path(installation_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(installation) = state.directory.get(&installation_id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": "unknown installation" })),
        )
            .into_response();
    };

    let signature_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !signature::verify(&body, signature_header, installation.webhook_secret.as_bytes()) {
        // Distinct from 404 at the boundary, but nothing about *why*
        // verification failed leaks to the sender.
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })))
            .into_response();
    }

    let event = match classifier::classify(&body) {
        Ok(event) => event,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "validation_error",
                    "message": err.to_string(),
                    "required": EnvelopeError::required_fields(),
                })),
            )
                .into_response();
        }
    };

    let meta = event.meta().clone();
    info!(
        event_id = %meta.id,
        event_type = %meta.event_type,
        subdomain = %meta.subdomain,
        "webhook event accepted"
    );

    // Synchronize and publish under the internal budget. On timeout the
    // response still acknowledges with the already-computed event id —
    // webhooks have no mid-flight cancellation contract, so failing fast
    // beats hanging the sender's delivery pool.
    let budget = state.config.ingress_timeout();
    if tokio::time::timeout(budget, process_event(&state, &event, &installation))
        .await
        .is_err()
    {
        warn!(
            event_id = %meta.id,
            event_type = %meta.event_type,
            "ingress budget exhausted; acknowledging anyway"
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "processed",
            "eventId": meta.id,
            "eventType": meta.event_type,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
        .into_response()
}

/// Run synchronization and hand the resulting events to the publisher.
async fn process_event(state: &AppState, event: &WebhookEvent, installation: &Installation) {
    let synchronizer = ConversationSynchronizer::new(Arc::clone(&state.db));
    let outcome = synchronizer.apply(event, installation).await;

    for domain_event in outcome.events {
        let kind = domain_event.kind();
        if let Err(err) = state.publisher.publish(domain_event) {
            warn!(
                event_id = %event.meta().id,
                kind,
                %err,
                "domain event publish failed; acknowledgment unchanged"
            );
        }
    }
}
