//! Contract tests for the domain event wire schema.
//!
//! Downstream consumers (enrichment pipeline, analytics) parse these
//! shapes; the discriminator and payload key casing are frozen.

use deskbridge::models::conversation::ConversationStatus;
use deskbridge::models::domain_event::{
    AnalyticsPayload, ConversationPayload, DomainEvent, MessagePayload, WebhookPayload,
};
use deskbridge::models::message::MessageSender;
use serde_json::json;

#[test]
fn conversation_created_wire_shape() {
    let event = DomainEvent::ConversationCreated(ConversationPayload {
        conversation_id: "zendesk-123".into(),
        ticket_id: 123,
        customer_id: Some(456),
        agent_id: Some(789),
        status: ConversationStatus::Open,
        metadata: json!({ "subdomain": "acme" }),
    });

    let value = serde_json::to_value(&event).expect("serialize");
    assert_eq!(value["eventType"], "CONVERSATION_CREATED");
    assert_eq!(value["conversationId"], "zendesk-123");
    assert_eq!(value["ticketId"], 123);
    assert_eq!(value["customerId"], 456);
    assert_eq!(value["agentId"], 789);
    assert_eq!(value["status"], "OPEN");
    assert_eq!(value["metadata"]["subdomain"], "acme");
}

#[test]
fn conversation_updated_carries_delta_in_metadata() {
    let event = DomainEvent::ConversationUpdated(ConversationPayload {
        conversation_id: "zendesk-123".into(),
        ticket_id: 123,
        customer_id: None,
        agent_id: None,
        status: ConversationStatus::Resolved,
        metadata: json!({ "delta": { "status": { "from": "open", "to": "solved" } } }),
    });

    let value = serde_json::to_value(&event).expect("serialize");
    assert_eq!(value["eventType"], "CONVERSATION_UPDATED");
    assert_eq!(value["metadata"]["delta"]["status"]["from"], "open");
    assert_eq!(value["metadata"]["delta"]["status"]["to"], "solved");
}

#[test]
fn message_created_wire_shape() {
    let event = DomainEvent::MessageCreated(MessagePayload {
        message_id: "zendesk-comment-9001".into(),
        conversation_id: "zendesk-123".into(),
        content: "hello".into(),
        sender: MessageSender::Agent,
        metadata: json!({}),
    });

    let value = serde_json::to_value(&event).expect("serialize");
    assert_eq!(value["eventType"], "MESSAGE_CREATED");
    assert_eq!(value["messageId"], "zendesk-comment-9001");
    assert_eq!(value["conversationId"], "zendesk-123");
    assert_eq!(value["content"], "hello");
    assert_eq!(value["sender"], "AGENT");
}

#[test]
fn analytics_computed_wire_shape() {
    let event = DomainEvent::AnalyticsComputed(AnalyticsPayload {
        conversation_id: "zendesk-123".into(),
        metric_type: "conversation_completed".into(),
        value: 1.0,
        aggregation_type: "count".into(),
        time_window: "instant".into(),
    });

    let value = serde_json::to_value(&event).expect("serialize");
    assert_eq!(value["eventType"], "ANALYTICS_COMPUTED");
    assert_eq!(value["conversationId"], "zendesk-123");
    assert_eq!(value["metricType"], "conversation_completed");
    assert_eq!(value["value"], 1.0);
    assert_eq!(value["aggregationType"], "count");
    assert_eq!(value["timeWindow"], "instant");
}

#[test]
fn webhook_forward_wire_shape() {
    let event = DomainEvent::Webhook(WebhookPayload {
        source: "zendesk".into(),
        event_type: "organization.created".into(),
        payload: json!({ "id": "w3" }),
    });

    let value = serde_json::to_value(&event).expect("serialize");
    assert_eq!(value["eventType"], "WEBHOOK");
    assert_eq!(value["source"], "zendesk");
    assert_eq!(value["payload"]["id"], "w3");
}

#[test]
fn wire_shape_round_trips() {
    let event = DomainEvent::AnalyticsComputed(AnalyticsPayload {
        conversation_id: "zendesk-1".into(),
        metric_type: "assignment_change".into(),
        value: 1.0,
        aggregation_type: "count".into(),
        time_window: "instant".into(),
    });

    let value = serde_json::to_value(&event).expect("serialize");
    let back: DomainEvent = serde_json::from_value(value).expect("deserialize");
    assert_eq!(back, event);
}
