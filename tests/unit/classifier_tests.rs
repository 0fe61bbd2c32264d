//! Unit tests for webhook envelope classification.
//!
//! Validates:
//! - Structural validation runs before type dispatch
//! - Known event types parse into typed variants
//! - Unknown event types classify as `Unknown`, not errors

use deskbridge::classifier::{classify, EnvelopeError};
use deskbridge::models::event::WebhookEvent;
use serde_json::json;

fn envelope(event_type: &str, body: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "w1",
        "event_type": event_type,
        "event_timestamp": "2024-01-01T12:00:00Z",
        "account": { "subdomain": "acme" },
        "subject": "123",
        "body": body,
    }))
    .expect("serialize envelope")
}

#[test]
fn classifies_ticket_created() {
    let raw = envelope(
        "ticket.created",
        json!({ "current": { "id": 123, "requester_id": 456, "status": "new", "description": "help" } }),
    );

    let event = classify(&raw).expect("classify");
    match event {
        WebhookEvent::TicketCreated(e) => {
            assert_eq!(e.meta.id, "w1");
            assert_eq!(e.meta.subdomain, "acme");
            assert_eq!(e.current.id, 123);
            assert_eq!(e.current.requester_id, Some(456));
            assert_eq!(e.current.description.as_deref(), Some("help"));
            assert!(e.previous.is_none());
        }
        other => panic!("expected TicketCreated, got {other:?}"),
    }
}

#[test]
fn classifies_ticket_updated_with_previous() {
    let raw = envelope(
        "ticket.updated",
        json!({
            "current": { "id": 123, "status": "solved" },
            "previous": { "id": 123, "status": "open" },
        }),
    );

    let event = classify(&raw).expect("classify");
    match event {
        WebhookEvent::TicketUpdated(e) => {
            let previous = e.previous.expect("previous snapshot");
            assert_eq!(previous.status.as_deref(), Some("open"));
            assert_eq!(e.current.status.as_deref(), Some("solved"));
        }
        other => panic!("expected TicketUpdated, got {other:?}"),
    }
}

#[test]
fn classifies_status_changed_as_its_own_variant() {
    let raw = envelope(
        "ticket.status_changed",
        json!({ "current": { "id": 123, "status": "closed" } }),
    );

    assert!(matches!(
        classify(&raw).expect("classify"),
        WebhookEvent::TicketStatusChanged(_)
    ));
}

#[test]
fn classifies_comment_created() {
    let raw = envelope(
        "comment.created",
        json!({ "current": { "id": 9001, "body": "thanks!", "public": true, "author_id": 77 } }),
    );

    let event = classify(&raw).expect("classify");
    match event {
        WebhookEvent::CommentCreated(e) => {
            assert_eq!(e.current.id, 9001);
            assert!(e.current.public);
            assert_eq!(e.meta.subject.as_deref(), Some("123"));
        }
        other => panic!("expected CommentCreated, got {other:?}"),
    }
}

#[test]
fn unknown_event_type_is_not_an_error() {
    let raw = envelope("organization.created", json!({ "current": { "id": 5 } }));

    let event = classify(&raw).expect("classify");
    match event {
        WebhookEvent::Unknown(e) => {
            assert_eq!(e.meta.event_type, "organization.created");
            // The raw envelope rides along for opaque forwarding.
            assert_eq!(e.payload["id"], "w1");
        }
        other => panic!("expected Unknown, got {other:?}"),
    }
}

#[test]
fn missing_subdomain_is_rejected_before_dispatch() {
    let raw = serde_json::to_vec(&json!({
        "id": "w1",
        "event_type": "ticket.created",
        "event_timestamp": "2024-01-01T12:00:00Z",
        "account": {},
        "body": { "current": { "id": 123 } },
    }))
    .expect("serialize");

    let err = classify(&raw).expect_err("must reject");
    assert_eq!(err, EnvelopeError::MissingFields(vec!["account.subdomain"]));
}

#[test]
fn all_missing_fields_are_reported_together() {
    let raw = serde_json::to_vec(&json!({ "body": {} })).expect("serialize");

    let err = classify(&raw).expect_err("must reject");
    assert_eq!(
        err,
        EnvelopeError::MissingFields(vec![
            "id",
            "event_type",
            "event_timestamp",
            "account.subdomain",
        ])
    );
}

#[test]
fn empty_strings_count_as_missing() {
    let raw = serde_json::to_vec(&json!({
        "id": "",
        "event_type": "ticket.created",
        "event_timestamp": "2024-01-01T12:00:00Z",
        "account": { "subdomain": "acme" },
    }))
    .expect("serialize");

    let err = classify(&raw).expect_err("must reject");
    assert_eq!(err, EnvelopeError::MissingFields(vec!["id"]));
}

#[test]
fn non_json_body_is_malformed() {
    let err = classify(b"not json at all").expect_err("must reject");
    assert!(matches!(err, EnvelopeError::Malformed(_)));
}

#[test]
fn known_type_without_current_body_is_invalid() {
    let raw = envelope("ticket.created", json!({}));

    let err = classify(&raw).expect_err("must reject");
    match err {
        EnvelopeError::InvalidBody { event_type, .. } => {
            assert_eq!(event_type, "ticket.created");
        }
        other => panic!("expected InvalidBody, got {other:?}"),
    }
}

#[test]
fn known_type_with_mistyped_body_is_invalid() {
    let raw = envelope("comment.created", json!({ "current": { "id": "not a number" } }));

    assert!(matches!(
        classify(&raw).expect_err("must reject"),
        EnvelopeError::InvalidBody { .. }
    ));
}
