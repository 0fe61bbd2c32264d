//! Unit tests for domain model invariants and serde shapes.

use deskbridge::models::conversation::{
    conversation_id, conversation_id_for_ref, ConversationStatus,
};
use deskbridge::models::domain_event::{DomainEvent, MessagePayload};
use deskbridge::models::installation::Installation;
use deskbridge::models::message::{description_message_id, message_id, MessageSender};
use serde_json::json;

#[test]
fn sender_classification_follows_visibility_flag() {
    // Inherited polarity: public comments classify as AGENT, private
    // ones as CUSTOMER.
    assert_eq!(MessageSender::from_visibility(true), MessageSender::Agent);
    assert_eq!(MessageSender::from_visibility(false), MessageSender::Customer);
}

#[test]
fn identifiers_are_deterministic() {
    assert_eq!(conversation_id(123), "zendesk-123");
    assert_eq!(conversation_id_for_ref("123"), "zendesk-123");
    assert_eq!(message_id(9001), "zendesk-comment-9001");
    assert_eq!(description_message_id(123), "zendesk-ticket-123-description");
}

#[test]
fn status_serializes_screaming_snake_case() {
    assert_eq!(
        serde_json::to_value(ConversationStatus::OnHold).expect("serialize"),
        json!("ON_HOLD")
    );
    let parsed: ConversationStatus = serde_json::from_value(json!("RESOLVED")).expect("parse");
    assert_eq!(parsed, ConversationStatus::Resolved);
}

#[test]
fn sender_serializes_screaming_snake_case() {
    assert_eq!(
        serde_json::to_value(MessageSender::Customer).expect("serialize"),
        json!("CUSTOMER")
    );
}

#[test]
fn domain_event_wire_shape_uses_event_type_tag() {
    let event = DomainEvent::MessageCreated(MessagePayload {
        message_id: "zendesk-ticket-123-description".into(),
        conversation_id: "zendesk-123".into(),
        content: "help".into(),
        sender: MessageSender::Customer,
        metadata: json!({}),
    });

    let value = serde_json::to_value(&event).expect("serialize");
    assert_eq!(value["eventType"], "MESSAGE_CREATED");
    assert_eq!(value["messageId"], "zendesk-ticket-123-description");
    assert_eq!(value["conversationId"], "zendesk-123");
    assert_eq!(value["sender"], "CUSTOMER");
}

#[test]
fn domain_event_kind_matches_wire_tag() {
    let event = DomainEvent::MessageCreated(MessagePayload {
        message_id: "m".into(),
        conversation_id: "c".into(),
        content: String::new(),
        sender: MessageSender::Agent,
        metadata: json!({}),
    });
    assert_eq!(event.kind(), "MESSAGE_CREATED");
}

#[test]
fn new_installation_has_empty_tokens_and_default_settings() {
    let installation = Installation::new(
        "acme".into(),
        "user-1".into(),
        "app-1".into(),
        "secret".into(),
    );

    assert!(!installation.id.is_empty());
    assert!(installation.access_token.is_empty());
    assert!(installation.refresh_token.is_none());
    assert!(!installation.settings.sentiment_enabled);
    assert!(!installation.settings.suggestions_enabled);
    assert!(installation.last_active_at.is_none());
}

#[test]
fn installation_settings_unknown_keys_survive_round_trip() {
    let raw = json!({
        "sentiment_enabled": true,
        "suggestions_enabled": false,
        "digest_frequency": "weekly",
    });

    let settings: deskbridge::models::installation::InstallationSettings =
        serde_json::from_value(raw.clone()).expect("parse");
    assert!(settings.sentiment_enabled);

    let back = serde_json::to_value(&settings).expect("serialize");
    assert_eq!(back["digest_frequency"], "weekly");
}
