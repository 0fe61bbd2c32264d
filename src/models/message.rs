//! Message model and sender classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Party that authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageSender {
    /// A support agent.
    Agent,
    /// The end customer.
    Customer,
}

impl MessageSender {
    /// Classify a comment author from the comment's visibility flag.
    ///
    /// Public comments map to `Agent` and private ones to `Customer`.
    /// This polarity is inherited from the upstream system and looks
    /// inverted (customers normally cannot post private notes); it is
    /// kept as-is for compatibility pending product confirmation.
    #[must_use]
    pub fn from_visibility(public: bool) -> Self {
        if public {
            Self::Agent
        } else {
            Self::Customer
        }
    }

    /// Stable string form used in storage and published events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "AGENT",
            Self::Customer => "CUSTOMER",
        }
    }
}

/// Normalized representation of one ticket comment.
///
/// Belongs to exactly one conversation; insertion order is preserved via
/// `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Message {
    /// Deterministic identifier (`zendesk-comment-<comment_id>`).
    pub id: String,
    /// Owning conversation identifier.
    pub conversation_id: String,
    /// Message text content.
    pub content: String,
    /// Sender classification.
    pub sender: MessageSender,
    /// Source channel the comment arrived through, when known.
    pub channel: Option<String>,
    /// Free-form metadata carried from the source event.
    pub metadata: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Deterministic message id for an external comment.
#[must_use]
pub fn message_id(comment_id: i64) -> String {
    format!("zendesk-comment-{comment_id}")
}

/// Deterministic message id for the initial description synthesized from
/// a `ticket.created` event. Replays of the same event converge here.
#[must_use]
pub fn description_message_id(ticket_id: i64) -> String {
    format!("zendesk-ticket-{ticket_id}-description")
}
