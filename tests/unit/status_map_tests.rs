//! Unit tests for the external-to-internal status mapping.

use deskbridge::models::conversation::ConversationStatus;

#[test]
fn maps_full_external_vocabulary() {
    assert_eq!(
        ConversationStatus::from_external("new"),
        ConversationStatus::Open
    );
    assert_eq!(
        ConversationStatus::from_external("open"),
        ConversationStatus::Open
    );
    assert_eq!(
        ConversationStatus::from_external("pending"),
        ConversationStatus::Waiting
    );
    assert_eq!(
        ConversationStatus::from_external("hold"),
        ConversationStatus::OnHold
    );
    assert_eq!(
        ConversationStatus::from_external("solved"),
        ConversationStatus::Resolved
    );
    assert_eq!(
        ConversationStatus::from_external("closed"),
        ConversationStatus::Closed
    );
}

#[test]
fn unmapped_values_default_to_open() {
    assert_eq!(
        ConversationStatus::from_external("escalated"),
        ConversationStatus::Open
    );
    assert_eq!(
        ConversationStatus::from_external(""),
        ConversationStatus::Open
    );
}

#[test]
fn string_forms_are_stable() {
    assert_eq!(ConversationStatus::Open.as_str(), "OPEN");
    assert_eq!(ConversationStatus::Waiting.as_str(), "WAITING");
    assert_eq!(ConversationStatus::OnHold.as_str(), "ON_HOLD");
    assert_eq!(ConversationStatus::Resolved.as_str(), "RESOLVED");
    assert_eq!(ConversationStatus::Closed.as_str(), "CLOSED");
}

#[test]
fn only_resolved_and_closed_are_terminal() {
    assert!(ConversationStatus::Resolved.is_terminal());
    assert!(ConversationStatus::Closed.is_terminal());
    assert!(!ConversationStatus::Open.is_terminal());
    assert!(!ConversationStatus::Waiting.is_terminal());
    assert!(!ConversationStatus::OnHold.is_terminal());
}
