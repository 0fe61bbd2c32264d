//! Unit tests for `InstallationRepo` CRUD operations.

use std::sync::Arc;

use deskbridge::models::installation::{Installation, InstallationSettings};
use deskbridge::persistence::{db, installation_repo::InstallationRepo};
use deskbridge::AppError;

fn sample(subdomain: &str) -> Installation {
    Installation::new(
        subdomain.to_owned(),
        "user-1".to_owned(),
        "app-1".to_owned(),
        "c2VjcmV0LXNlY3JldC1zZWNyZXQtc2VjcmV0LTEyMzQ=".to_owned(),
    )
}

#[tokio::test]
async fn create_persists_all_fields() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    let installation = sample("acme");
    let id = installation.id.clone();
    repo.create(&installation).await.expect("create");

    let fetched = repo.get_by_id(&id).await.expect("query").expect("exists");
    assert_eq!(fetched.subdomain, "acme");
    assert_eq!(fetched.user_id, "user-1");
    assert_eq!(fetched.app_id, "app-1");
    assert!(fetched.access_token.is_empty());
    assert!(fetched.refresh_token.is_none());
    assert!(fetched.last_active_at.is_none());
    assert!(!fetched.settings.sentiment_enabled);
}

#[tokio::test]
async fn get_by_id_returns_none_for_missing() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    assert!(repo.get_by_id("nonexistent").await.expect("query").is_none());
}

#[tokio::test]
async fn find_by_triple_matches_exactly() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    let installation = sample("acme");
    repo.create(&installation).await.expect("create");

    let found = repo
        .find_by_triple("acme", "user-1", "app-1")
        .await
        .expect("query");
    assert_eq!(found.map(|i| i.id), Some(installation.id));

    let missing = repo
        .find_by_triple("acme", "user-2", "app-1")
        .await
        .expect("query");
    assert!(missing.is_none());
}

#[tokio::test]
async fn duplicate_triple_is_rejected() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    repo.create(&sample("acme")).await.expect("first create");
    let result = repo.create(&sample("acme")).await;
    assert!(result.is_err(), "unique triple index must reject duplicates");
}

#[tokio::test]
async fn update_tokens_replaces_the_pair() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    let installation = sample("acme");
    let id = installation.id.clone();
    repo.create(&installation).await.expect("create");

    repo.update_tokens(&id, "access-2", Some("refresh-2"))
        .await
        .expect("update");

    let fetched = repo.get_by_id(&id).await.expect("query").expect("exists");
    assert_eq!(fetched.access_token, "access-2");
    assert_eq!(fetched.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn update_tokens_on_missing_installation_is_not_found() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    let err = repo
        .update_tokens("nonexistent", "a", None)
        .await
        .expect_err("missing installation");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn update_settings_round_trips_flags_and_extras() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    let installation = sample("acme");
    let id = installation.id.clone();
    repo.create(&installation).await.expect("create");

    let mut settings = InstallationSettings {
        sentiment_enabled: true,
        suggestions_enabled: false,
        ..InstallationSettings::default()
    };
    settings
        .extra
        .insert("theme".into(), serde_json::Value::String("dark".into()));

    repo.update_settings(&id, &settings).await.expect("update");

    let fetched = repo.get_by_id(&id).await.expect("query").expect("exists");
    assert!(fetched.settings.sentiment_enabled);
    assert_eq!(
        fetched.settings.extra.get("theme"),
        Some(&serde_json::Value::String("dark".into()))
    );
}

#[tokio::test]
async fn delete_removes_the_record() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    let installation = sample("acme");
    let id = installation.id.clone();
    repo.create(&installation).await.expect("create");

    repo.delete(&id).await.expect("delete");
    assert!(repo.get_by_id(&id).await.expect("query").is_none());

    let err = repo.delete(&id).await.expect_err("second delete");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn list_all_returns_every_record() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    repo.create(&sample("acme")).await.expect("create acme");
    repo.create(&sample("globex")).await.expect("create globex");

    let all = repo.list_all().await.expect("list");
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn touch_last_active_sets_timestamp() {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(database);

    let installation = sample("acme");
    let id = installation.id.clone();
    repo.create(&installation).await.expect("create");

    repo.touch_last_active(&id).await.expect("touch");
    let fetched = repo.get_by_id(&id).await.expect("query").expect("exists");
    assert!(fetched.last_active_at.is_some());
}
