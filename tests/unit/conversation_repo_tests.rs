//! Unit tests for `ConversationRepo` upsert semantics.

use std::sync::Arc;

use chrono::Utc;
use deskbridge::models::conversation::{conversation_id, Conversation, ConversationStatus};
use deskbridge::persistence::{conversation_repo::ConversationRepo, db};
use serde_json::json;

fn sample(ticket_id: i64, status: ConversationStatus) -> Conversation {
    let now = Utc::now();
    Conversation {
        id: conversation_id(ticket_id),
        ticket_id,
        customer_id: Some(456),
        agent_id: Some(789),
        status,
        subject: Some("Cannot log in".into()),
        priority: Some("normal".into()),
        tags: vec!["billing".into()],
        metadata: json!({ "subdomain": "acme" }),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn upsert_inserts_new_conversation() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = ConversationRepo::new(database);

    repo.upsert(&sample(123, ConversationStatus::Open))
        .await
        .expect("upsert");

    let fetched = repo
        .get_by_id("zendesk-123")
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(fetched.ticket_id, 123);
    assert_eq!(fetched.status, ConversationStatus::Open);
    assert_eq!(fetched.tags, vec!["billing".to_owned()]);
}

#[tokio::test]
async fn upsert_converges_on_latest_state() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = ConversationRepo::new(database);

    let original = sample(123, ConversationStatus::Open);
    repo.upsert(&original).await.expect("first upsert");

    let mut updated = sample(123, ConversationStatus::Resolved);
    updated.agent_id = Some(999);
    repo.upsert(&updated).await.expect("second upsert");

    let fetched = repo
        .get_by_id("zendesk-123")
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(fetched.status, ConversationStatus::Resolved);
    assert_eq!(fetched.agent_id, Some(999));
    assert_eq!(repo.count().await.expect("count"), 1);
}

#[tokio::test]
async fn upsert_preserves_original_created_at() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = ConversationRepo::new(database);

    let original = sample(123, ConversationStatus::Open);
    repo.upsert(&original).await.expect("first upsert");

    let mut replay = sample(123, ConversationStatus::Open);
    replay.created_at = Utc::now() + chrono::Duration::hours(1);
    repo.upsert(&replay).await.expect("replay upsert");

    let fetched = repo
        .get_by_id("zendesk-123")
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(
        fetched.created_at.timestamp(),
        original.created_at.timestamp(),
        "replays must not rewrite creation history"
    );
}

#[tokio::test]
async fn get_by_id_returns_none_for_missing() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = ConversationRepo::new(database);

    assert!(repo
        .get_by_id("zendesk-404")
        .await
        .expect("query")
        .is_none());
}
