//! Classified webhook event variants and their typed payload snapshots.
//!
//! The raw envelope is parsed exactly once at the classification boundary
//! into this closed variant set; everything downstream matches
//! exhaustively, with `Unknown` as an explicit variant rather than a
//! default branch.

use serde::{Deserialize, Serialize};

/// Envelope fields common to every webhook event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EventMeta {
    /// Event identifier assigned by the helpdesk platform.
    pub id: String,
    /// Raw `event_type` discriminator string.
    pub event_type: String,
    /// ISO-8601 event timestamp as delivered.
    pub timestamp: String,
    /// Originating account subdomain.
    pub subdomain: String,
    /// Envelope subject; for comment events this carries the external
    /// ticket reference the comment belongs to.
    pub subject: Option<String>,
}

/// Typed snapshot of a ticket carried in `body.current` / `body.previous`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TicketSnapshot {
    /// External ticket identifier.
    pub id: i64,
    /// Requester (customer) identifier.
    #[serde(default)]
    pub requester_id: Option<i64>,
    /// Assigned agent identifier.
    #[serde(default)]
    pub assignee_id: Option<i64>,
    /// External status vocabulary value (`new`, `open`, `pending`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Ticket priority.
    #[serde(default)]
    pub priority: Option<String>,
    /// Ticket subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Initial ticket description, present on creation events.
    #[serde(default)]
    pub description: Option<String>,
    /// Ticket tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Upstream creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Upstream update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Typed snapshot of a comment carried in `body.current` / `body.previous`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CommentSnapshot {
    /// External comment identifier.
    pub id: i64,
    /// Comment text.
    #[serde(default)]
    pub body: Option<String>,
    /// Upstream visibility flag; drives sender classification.
    #[serde(default)]
    pub public: bool,
    /// Comment author identifier.
    #[serde(default)]
    pub author_id: Option<i64>,
    /// Channel the comment arrived through (web, email, api, ...).
    #[serde(default)]
    pub channel: Option<String>,
    /// Upstream creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A ticket lifecycle event with current and optional previous snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TicketEvent {
    /// Envelope fields.
    pub meta: EventMeta,
    /// Ticket state after the change.
    pub current: TicketSnapshot,
    /// Ticket state before the change, when the platform supplies it.
    pub previous: Option<TicketSnapshot>,
}

/// A comment lifecycle event with current and optional previous snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CommentEvent {
    /// Envelope fields.
    pub meta: EventMeta,
    /// Comment state after the change.
    pub current: CommentSnapshot,
    /// Comment state before the change, when the platform supplies it.
    pub previous: Option<CommentSnapshot>,
}

/// An event whose type is outside the known set.
///
/// Still acknowledged and forwarded opaquely downstream for
/// forward-compatibility with event types the platform introduces later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct UnknownEvent {
    /// Envelope fields.
    pub meta: EventMeta,
    /// The untyped event body as delivered.
    pub payload: serde_json::Value,
}

/// A webhook event classified into the closed variant set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    /// `ticket.created`
    TicketCreated(TicketEvent),
    /// `ticket.updated`
    TicketUpdated(TicketEvent),
    /// `ticket.status_changed`
    TicketStatusChanged(TicketEvent),
    /// `comment.created`
    CommentCreated(CommentEvent),
    /// `comment.updated`
    CommentUpdated(CommentEvent),
    /// Any `event_type` outside the known set.
    Unknown(UnknownEvent),
}

impl WebhookEvent {
    /// Envelope fields of the underlying event.
    #[must_use]
    pub fn meta(&self) -> &EventMeta {
        match self {
            Self::TicketCreated(e) | Self::TicketUpdated(e) | Self::TicketStatusChanged(e) => {
                &e.meta
            }
            Self::CommentCreated(e) | Self::CommentUpdated(e) => &e.meta,
            Self::Unknown(e) => &e.meta,
        }
    }
}
