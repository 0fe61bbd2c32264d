//! Unit tests for database connection bootstrap.

use std::sync::Arc;

use deskbridge::models::installation::Installation;
use deskbridge::persistence::{db, installation_repo::InstallationRepo};
use tempfile::tempdir;

#[tokio::test]
async fn connect_creates_file_and_schema() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("bridge.db");

    let pool = db::connect(&path).await.expect("connect");
    assert!(path.exists(), "database file created with parent dirs");

    // Schema is usable immediately.
    let repo = InstallationRepo::new(Arc::new(pool));
    let installation = Installation::new(
        "acme".into(),
        "user-1".into(),
        "app-1".into(),
        "secret".into(),
    );
    repo.create(&installation).await.expect("insert");
    assert_eq!(repo.list_all().await.expect("list").len(), 1);
}

#[tokio::test]
async fn reconnect_is_idempotent_and_keeps_data() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bridge.db");

    {
        let pool = db::connect(&path).await.expect("first connect");
        let repo = InstallationRepo::new(Arc::new(pool));
        let installation = Installation::new(
            "acme".into(),
            "user-1".into(),
            "app-1".into(),
            "secret".into(),
        );
        repo.create(&installation).await.expect("insert");
    }

    // Schema bootstrap re-runs without clobbering existing rows.
    let pool = db::connect(&path).await.expect("second connect");
    let repo = InstallationRepo::new(Arc::new(pool));
    assert_eq!(repo.list_all().await.expect("list").len(), 1);
}
