//! Webhook envelope classification.
//!
//! Parses a raw inbound payload into the closed [`WebhookEvent`] variant
//! set or rejects it as malformed. Structural validation of the envelope
//! runs before any type-specific parsing, so a missing `id` is reported
//! the same way regardless of event type. Pure function; no side
//! effects.

use std::fmt::{Display, Formatter};

use serde_json::Value;

use crate::models::event::{
    CommentEvent, CommentSnapshot, EventMeta, TicketEvent, TicketSnapshot, UnknownEvent,
    WebhookEvent,
};

/// `event_type` values this server parses into typed variants.
pub const KNOWN_EVENT_TYPES: [&str; 5] = [
    "ticket.created",
    "ticket.updated",
    "ticket.status_changed",
    "comment.created",
    "comment.updated",
];

/// Envelope fields that must be present and non-empty on every event.
pub const REQUIRED_ENVELOPE_FIELDS: [&str; 4] =
    ["id", "event_type", "event_timestamp", "account.subdomain"];

/// Rejection reasons produced by [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The body is not valid JSON.
    Malformed(String),
    /// Required envelope fields are missing or empty.
    MissingFields(Vec<&'static str>),
    /// The typed body for a known `event_type` failed structural
    /// validation.
    InvalidBody {
        /// The event type whose body failed to parse.
        event_type: String,
        /// Parser detail, safe to echo to the sender.
        detail: String,
    },
}

impl EnvelopeError {
    /// The full required-field list, echoed on 400 responses.
    #[must_use]
    pub fn required_fields() -> &'static [&'static str] {
        &REQUIRED_ENVELOPE_FIELDS
    }
}

impl Display for EnvelopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(detail) => write!(f, "envelope is not valid json: {detail}"),
            Self::MissingFields(fields) => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
            Self::InvalidBody { event_type, detail } => {
                write!(f, "invalid body for {event_type}: {detail}")
            }
        }
    }
}

/// Classify a raw webhook body into a typed event or a rejection.
///
/// Unrecognized `event_type` values are not errors; they classify as
/// [`WebhookEvent::Unknown`] and are forwarded opaquely downstream.
///
/// # Errors
///
/// Returns [`EnvelopeError`] when the body is not JSON, when required
/// envelope fields are missing or empty, or when a known event type
/// carries a body that does not match its schema.
pub fn classify(raw: &[u8]) -> std::result::Result<WebhookEvent, EnvelopeError> {
    let root: Value =
        serde_json::from_slice(raw).map_err(|err| EnvelopeError::Malformed(err.to_string()))?;

    let meta = validate_envelope(&root)?;

    match meta.event_type.as_str() {
        "ticket.created" => {
            let (current, previous) = ticket_body(&root, &meta.event_type)?;
            Ok(WebhookEvent::TicketCreated(TicketEvent {
                meta,
                current,
                previous,
            }))
        }
        "ticket.updated" => {
            let (current, previous) = ticket_body(&root, &meta.event_type)?;
            Ok(WebhookEvent::TicketUpdated(TicketEvent {
                meta,
                current,
                previous,
            }))
        }
        "ticket.status_changed" => {
            let (current, previous) = ticket_body(&root, &meta.event_type)?;
            Ok(WebhookEvent::TicketStatusChanged(TicketEvent {
                meta,
                current,
                previous,
            }))
        }
        "comment.created" => {
            let (current, previous) = comment_body(&root, &meta.event_type)?;
            Ok(WebhookEvent::CommentCreated(CommentEvent {
                meta,
                current,
                previous,
            }))
        }
        "comment.updated" => {
            let (current, previous) = comment_body(&root, &meta.event_type)?;
            Ok(WebhookEvent::CommentUpdated(CommentEvent {
                meta,
                current,
                previous,
            }))
        }
        _ => Ok(WebhookEvent::Unknown(UnknownEvent {
            meta,
            payload: root,
        })),
    }
}

/// Check the envelope-level required fields and extract [`EventMeta`].
fn validate_envelope(root: &Value) -> std::result::Result<EventMeta, EnvelopeError> {
    let id = non_empty_str(root.get("id"));
    let event_type = non_empty_str(root.get("event_type"));
    let timestamp = non_empty_str(root.get("event_timestamp"));
    let subdomain = non_empty_str(root.get("account").and_then(|a| a.get("subdomain")));

    let mut missing = Vec::new();
    if id.is_none() {
        missing.push("id");
    }
    if event_type.is_none() {
        missing.push("event_type");
    }
    if timestamp.is_none() {
        missing.push("event_timestamp");
    }
    if subdomain.is_none() {
        missing.push("account.subdomain");
    }
    if !missing.is_empty() {
        return Err(EnvelopeError::MissingFields(missing));
    }

    // The unwraps above are guarded by the missing-field check.
    Ok(EventMeta {
        id: id.unwrap_or_default(),
        event_type: event_type.unwrap_or_default(),
        timestamp: timestamp.unwrap_or_default(),
        subdomain: subdomain.unwrap_or_default(),
        subject: non_empty_str(root.get("subject")),
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn ticket_body(
    root: &Value,
    event_type: &str,
) -> std::result::Result<(TicketSnapshot, Option<TicketSnapshot>), EnvelopeError> {
    let current = body_field(root, event_type, "current")?;
    let current: TicketSnapshot =
        serde_json::from_value(current).map_err(|err| EnvelopeError::InvalidBody {
            event_type: event_type.to_owned(),
            detail: err.to_string(),
        })?;
    let previous = optional_body_field(root, "previous")
        .map(serde_json::from_value)
        .transpose()
        .map_err(|err| EnvelopeError::InvalidBody {
            event_type: event_type.to_owned(),
            detail: err.to_string(),
        })?;
    Ok((current, previous))
}

fn comment_body(
    root: &Value,
    event_type: &str,
) -> std::result::Result<(CommentSnapshot, Option<CommentSnapshot>), EnvelopeError> {
    let current = body_field(root, event_type, "current")?;
    let current: CommentSnapshot =
        serde_json::from_value(current).map_err(|err| EnvelopeError::InvalidBody {
            event_type: event_type.to_owned(),
            detail: err.to_string(),
        })?;
    let previous = optional_body_field(root, "previous")
        .map(serde_json::from_value)
        .transpose()
        .map_err(|err| EnvelopeError::InvalidBody {
            event_type: event_type.to_owned(),
            detail: err.to_string(),
        })?;
    Ok((current, previous))
}

fn body_field(
    root: &Value,
    event_type: &str,
    key: &str,
) -> std::result::Result<Value, EnvelopeError> {
    root.get("body")
        .and_then(|b| b.get(key))
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| EnvelopeError::InvalidBody {
            event_type: event_type.to_owned(),
            detail: format!("body.{key} is required"),
        })
}

fn optional_body_field(root: &Value, key: &str) -> Option<Value> {
    root.get("body")
        .and_then(|b| b.get(key))
        .filter(|v| !v.is_null())
        .cloned()
}
