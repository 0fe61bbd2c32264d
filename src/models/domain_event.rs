//! Domain events published toward the downstream broker.
//!
//! These are normalized, platform-agnostic facts; the wire shape
//! (camelCase payloads, SCREAMING event discriminator) is the contract
//! consumed by the enrichment pipeline and analytics services.

use serde::{Deserialize, Serialize};

use super::conversation::ConversationStatus;
use super::message::MessageSender;

/// Payload for conversation lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPayload {
    /// Deterministic conversation identifier.
    pub conversation_id: String,
    /// External ticket identifier.
    pub ticket_id: i64,
    /// Customer identifier, when known.
    pub customer_id: Option<i64>,
    /// Agent identifier, when known.
    pub agent_id: Option<i64>,
    /// Internal status after the change.
    pub status: ConversationStatus,
    /// Event metadata; update events carry the field-level delta here.
    pub metadata: serde_json::Value,
}

/// Payload for message lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    /// Deterministic message identifier.
    pub message_id: String,
    /// Owning conversation identifier.
    pub conversation_id: String,
    /// Message text content.
    pub content: String,
    /// Sender classification.
    pub sender: MessageSender,
    /// Event metadata carried from the source.
    pub metadata: serde_json::Value,
}

/// Payload for analytics facts derived during synchronization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPayload {
    /// Conversation the metric is attributed to.
    pub conversation_id: String,
    /// Metric discriminator (`assignment_change`, `conversation_completed`).
    pub metric_type: String,
    /// Metric value.
    pub value: f64,
    /// Aggregation the consumer should apply.
    pub aggregation_type: String,
    /// Time window the value covers.
    pub time_window: String,
}

/// Payload for opaque webhook forwards and enrichment triggers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// Originating system or trigger source.
    pub source: String,
    /// Raw event type string.
    pub event_type: String,
    /// Untyped payload as received.
    pub payload: serde_json::Value,
}

/// A normalized fact published for downstream consumption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "eventType")]
pub enum DomainEvent {
    /// A conversation was first observed.
    #[serde(rename = "CONVERSATION_CREATED")]
    ConversationCreated(ConversationPayload),
    /// A conversation changed; the payload metadata carries the delta.
    #[serde(rename = "CONVERSATION_UPDATED")]
    ConversationUpdated(ConversationPayload),
    /// A message was first observed.
    #[serde(rename = "MESSAGE_CREATED")]
    MessageCreated(MessagePayload),
    /// A message's content was revised.
    #[serde(rename = "MESSAGE_UPDATED")]
    MessageUpdated(MessagePayload),
    /// An analytics fact computed during synchronization.
    #[serde(rename = "ANALYTICS_COMPUTED")]
    AnalyticsComputed(AnalyticsPayload),
    /// An opaque forward: unrecognized platform events and
    /// sentiment/suggestion enrichment triggers.
    #[serde(rename = "WEBHOOK")]
    Webhook(WebhookPayload),
}

impl DomainEvent {
    /// Discriminator string for logging and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConversationCreated(_) => "CONVERSATION_CREATED",
            Self::ConversationUpdated(_) => "CONVERSATION_UPDATED",
            Self::MessageCreated(_) => "MESSAGE_CREATED",
            Self::MessageUpdated(_) => "MESSAGE_UPDATED",
            Self::AnalyticsComputed(_) => "ANALYTICS_COMPUTED",
            Self::Webhook(_) => "WEBHOOK",
        }
    }
}
