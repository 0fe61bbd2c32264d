//! Unit tests for the installation directory cache semantics.

use std::sync::Arc;

use deskbridge::directory::InstallationDirectory;
use deskbridge::models::installation::{Installation, InstallationSettings};
use deskbridge::persistence::{db, installation_repo::InstallationRepo};

fn sample(subdomain: &str) -> Installation {
    Installation::new(
        subdomain.to_owned(),
        "user-1".to_owned(),
        "app-1".to_owned(),
        "c2VjcmV0LXNlY3JldC1zZWNyZXQtc2VjcmV0LTEyMzQ=".to_owned(),
    )
}

async fn directory() -> (InstallationDirectory, InstallationRepo) {
    let database = Arc::new(db::connect_memory().await.expect("db"));
    let repo = InstallationRepo::new(Arc::clone(&database));
    (
        InstallationDirectory::new(InstallationRepo::new(database)),
        repo,
    )
}

#[tokio::test]
async fn insert_makes_installation_visible() {
    let (directory, _repo) = directory().await;

    let installation = sample("acme");
    let id = installation.id.clone();
    directory.insert(installation).await.expect("insert");

    assert!(directory.get(&id).await.is_some());
    assert!(directory.find_by_triple("acme", "user-1", "app-1").await.is_some());
    assert_eq!(directory.len().await, 1);
}

#[tokio::test]
async fn warm_loads_preexisting_rows() {
    let (directory, repo) = directory().await;

    // Rows written before this process started.
    repo.create(&sample("acme")).await.expect("create acme");
    repo.create(&sample("globex")).await.expect("create globex");

    assert!(directory.is_empty().await, "cache starts cold");
    let loaded = directory.warm().await.expect("warm");
    assert_eq!(loaded, 2);
    assert!(directory.find_by_triple("globex", "user-1", "app-1").await.is_some());
}

#[tokio::test]
async fn remove_evicts_cache_and_row_together() {
    let (directory, repo) = directory().await;

    let installation = sample("acme");
    let id = installation.id.clone();
    directory.insert(installation).await.expect("insert");

    directory.remove(&id).await.expect("remove");

    assert!(directory.get(&id).await.is_none(), "cache evicted");
    assert!(
        repo.get_by_id(&id).await.expect("query").is_none(),
        "row deleted"
    );
}

#[tokio::test]
async fn update_settings_refreshes_cache() {
    let (directory, _repo) = directory().await;

    let installation = sample("acme");
    let id = installation.id.clone();
    directory.insert(installation).await.expect("insert");

    let settings = InstallationSettings {
        sentiment_enabled: true,
        ..InstallationSettings::default()
    };
    directory
        .update_settings(&id, &settings)
        .await
        .expect("update settings");

    let cached = directory.get(&id).await.expect("cached");
    assert!(cached.settings.sentiment_enabled);
}

#[tokio::test]
async fn update_tokens_refreshes_cache() {
    let (directory, _repo) = directory().await;

    let installation = sample("acme");
    let id = installation.id.clone();
    directory.insert(installation).await.expect("insert");

    directory
        .update_tokens(&id, "access-2", Some("refresh-2"))
        .await
        .expect("update tokens");

    let cached = directory.get(&id).await.expect("cached");
    assert_eq!(cached.access_token, "access-2");
    assert_eq!(cached.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn concurrent_reads_see_consistent_state() {
    let (directory, _repo) = directory().await;
    let directory = Arc::new(directory);

    let installation = sample("acme");
    let id = installation.id.clone();
    directory.insert(installation).await.expect("insert");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let directory = Arc::clone(&directory);
        let id = id.clone();
        handles.push(tokio::spawn(async move { directory.get(&id).await.is_some() }));
    }

    for handle in handles {
        assert!(handle.await.expect("join"));
    }
}
