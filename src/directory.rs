//! Installation directory — the shared keyed store consulted on every
//! request path.
//!
//! Read-mostly: webhook ingress and token verification only read; the
//! token authority and the installation management surface write. Reads
//! go through a `RwLock`-guarded in-memory map warmed from `SQLite` at
//! startup; writes hold the write lock across both the database
//! statement and the cache mutation, so a concurrent uninstall and token
//! refresh cannot interleave on the same installation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::installation::{Installation, InstallationSettings};
use crate::persistence::installation_repo::InstallationRepo;
use crate::Result;

/// Keyed store of installations, cache-backed by the repository.
pub struct InstallationDirectory {
    repo: InstallationRepo,
    cache: RwLock<HashMap<String, Installation>>,
}

impl InstallationDirectory {
    /// Create a directory over the given repository with an empty cache.
    #[must_use]
    pub fn new(repo: InstallationRepo) -> Self {
        Self {
            repo,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load all installations from the database into the cache.
    ///
    /// Returns the number of cached records.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the load query fails.
    pub async fn warm(&self) -> Result<usize> {
        let all = self.repo.list_all().await?;
        let mut cache = self.cache.write().await;
        cache.clear();
        for installation in all {
            cache.insert(installation.id.clone(), installation);
        }
        Ok(cache.len())
    }

    /// Look up an installation by identifier.
    pub async fn get(&self, id: &str) -> Option<Installation> {
        self.cache.read().await.get(id).cloned()
    }

    /// Look up an installation by its subdomain/user/app triple.
    pub async fn find_by_triple(
        &self,
        subdomain: &str,
        user_id: &str,
        app_id: &str,
    ) -> Option<Installation> {
        self.cache
            .read()
            .await
            .values()
            .find(|i| i.subdomain == subdomain && i.user_id == user_id && i.app_id == app_id)
            .cloned()
    }

    /// Insert a new installation into the store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails; the cache is
    /// only updated after the row is durable.
    pub async fn insert(&self, installation: Installation) -> Result<Installation> {
        let mut cache = self.cache.write().await;
        let created = self.repo.create(&installation).await?;
        cache.insert(created.id.clone(), created.clone());
        debug!(installation_id = %created.id, subdomain = %created.subdomain, "installation registered");
        Ok(created)
    }

    /// Replace the token pair on an installation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the installation does not exist and
    /// `AppError::Db` if the update fails.
    pub async fn update_tokens(
        &self,
        id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<Installation> {
        let mut cache = self.cache.write().await;
        self.repo
            .update_tokens(id, access_token, refresh_token)
            .await?;
        let updated = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| crate::AppError::NotFound(format!("installation {id} not found")))?;
        cache.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    /// Replace the settings map on an installation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the installation does not exist and
    /// `AppError::Db` if the update fails.
    pub async fn update_settings(
        &self,
        id: &str,
        settings: &InstallationSettings,
    ) -> Result<Installation> {
        let mut cache = self.cache.write().await;
        self.repo.update_settings(id, settings).await?;
        let updated = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| crate::AppError::NotFound(format!("installation {id} not found")))?;
        cache.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    /// Record a successful token verification, best-effort.
    ///
    /// A persistence failure here is logged and swallowed; activity
    /// tracking must never invalidate an otherwise successful
    /// verification.
    pub async fn touch_last_active(&self, id: &str) {
        if let Err(err) = self.repo.touch_last_active(id).await {
            warn!(installation_id = %id, %err, "failed to record last-active timestamp");
        }
        let mut cache = self.cache.write().await;
        if let Some(installation) = cache.get_mut(id) {
            installation.last_active_at = Some(chrono::Utc::now());
        }
    }

    /// Delete an installation, its secret, and its tokens.
    ///
    /// The database row and the cache entry go in the same write-lock
    /// section: once this returns, no reader can resolve the
    /// installation, so its tokens and webhook secret fail verification
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the installation does not exist and
    /// `AppError::Db` if the delete fails.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        self.repo.delete(id).await?;
        cache.remove(id);
        debug!(installation_id = %id, "installation removed");
        Ok(())
    }

    /// Number of cached installations.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Whether the directory holds no installations.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

/// Shared handle used across request handlers.
pub type SharedDirectory = Arc<InstallationDirectory>;
