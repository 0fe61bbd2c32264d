//! Conversation model and the external-to-internal status mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Internal lifecycle status for a support conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    /// Conversation is open and awaiting agent action.
    Open,
    /// Waiting on the customer.
    Waiting,
    /// Paused pending a third party.
    OnHold,
    /// Agent marked the issue solved.
    Resolved,
    /// Conversation is closed and immutable upstream.
    Closed,
}

impl ConversationStatus {
    /// Map an external ticket status onto the internal enum.
    ///
    /// Unmapped external values default to `Open`.
    #[must_use]
    pub fn from_external(status: &str) -> Self {
        match status {
            "pending" => Self::Waiting,
            "hold" => Self::OnHold,
            "solved" => Self::Resolved,
            "closed" => Self::Closed,
            // "new", "open", and anything unrecognized.
            _ => Self::Open,
        }
    }

    /// Stable string form used in storage and published events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Waiting => "WAITING",
            Self::OnHold => "ON_HOLD",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
        }
    }

    /// Whether the status terminates active work on the conversation.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

/// Normalized representation of a support ticket.
///
/// Identified deterministically from the external ticket id, so repeated
/// events for the same ticket converge on the same record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Conversation {
    /// Deterministic identifier (`zendesk-<ticket_id>`).
    pub id: String,
    /// External ticket identifier.
    pub ticket_id: i64,
    /// Requester (customer) identifier, when known.
    pub customer_id: Option<i64>,
    /// Assigned agent identifier, when known.
    pub agent_id: Option<i64>,
    /// Internal lifecycle status.
    pub status: ConversationStatus,
    /// Ticket subject line.
    pub subject: Option<String>,
    /// Ticket priority as reported upstream.
    pub priority: Option<String>,
    /// Ticket tags (order not significant).
    pub tags: Vec<String>,
    /// Free-form metadata carried from the source event.
    pub metadata: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Deterministic conversation id for an external ticket.
#[must_use]
pub fn conversation_id(ticket_id: i64) -> String {
    format!("zendesk-{ticket_id}")
}

/// Deterministic conversation id for a raw external ticket reference
/// (used when the source event carries the ticket id as a string).
#[must_use]
pub fn conversation_id_for_ref(ticket_ref: &str) -> String {
    format!("zendesk-{ticket_ref}")
}
