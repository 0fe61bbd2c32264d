//! Installation repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::installation::{Installation, InstallationSettings};
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for installation records.
#[derive(Clone)]
pub struct InstallationRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct InstallationRow {
    id: String,
    subdomain: String,
    app_id: String,
    user_id: String,
    webhook_secret: String,
    access_token: String,
    refresh_token: Option<String>,
    settings: String,
    created_at: String,
    updated_at: String,
    last_active_at: Option<String>,
}

impl InstallationRow {
    /// Convert a database row into the domain model.
    fn into_installation(self) -> Result<Installation> {
        let settings: InstallationSettings = serde_json::from_str(&self.settings)
            .map_err(|e| AppError::Db(format!("invalid settings json: {e}")))?;
        let created_at = parse_ts(&self.created_at, "created_at")?;
        let updated_at = parse_ts(&self.updated_at, "updated_at")?;
        let last_active_at = self
            .last_active_at
            .as_deref()
            .map(|s| parse_ts(s, "last_active_at"))
            .transpose()?;

        Ok(Installation {
            id: self.id,
            subdomain: self.subdomain,
            app_id: self.app_id,
            user_id: self.user_id,
            webhook_secret: self.webhook_secret,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            settings,
            created_at,
            updated_at,
            last_active_at,
        })
    }
}

fn parse_ts(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

impl InstallationRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new installation record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, installation: &Installation) -> Result<Installation> {
        let settings = serde_json::to_string(&installation.settings)
            .map_err(|e| AppError::Db(format!("settings serialization: {e}")))?;

        sqlx::query(
            "INSERT INTO installation (id, subdomain, app_id, user_id, webhook_secret,
             access_token, refresh_token, settings, created_at, updated_at, last_active_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&installation.id)
        .bind(&installation.subdomain)
        .bind(&installation.app_id)
        .bind(&installation.user_id)
        .bind(&installation.webhook_secret)
        .bind(&installation.access_token)
        .bind(&installation.refresh_token)
        .bind(&settings)
        .bind(installation.created_at.to_rfc3339())
        .bind(installation.updated_at.to_rfc3339())
        .bind(installation.last_active_at.map(|dt| dt.to_rfc3339()))
        .execute(self.db.as_ref())
        .await?;

        Ok(installation.clone())
    }

    /// Retrieve an installation by identifier.
    ///
    /// Returns `Ok(None)` if the installation does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Installation>> {
        let row: Option<InstallationRow> =
            sqlx::query_as("SELECT * FROM installation WHERE id = ?1")
                .bind(id)
                .fetch_optional(self.db.as_ref())
                .await?;

        row.map(InstallationRow::into_installation).transpose()
    }

    /// Retrieve the installation for a subdomain/user/app triple, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn find_by_triple(
        &self,
        subdomain: &str,
        user_id: &str,
        app_id: &str,
    ) -> Result<Option<Installation>> {
        let row: Option<InstallationRow> = sqlx::query_as(
            "SELECT * FROM installation
             WHERE subdomain = ?1 AND user_id = ?2 AND app_id = ?3",
        )
        .bind(subdomain)
        .bind(user_id)
        .bind(app_id)
        .fetch_optional(self.db.as_ref())
        .await?;

        row.map(InstallationRow::into_installation).transpose()
    }

    /// List all installations (used to warm the directory cache).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Installation>> {
        let rows: Vec<InstallationRow> = sqlx::query_as("SELECT * FROM installation")
            .fetch_all(self.db.as_ref())
            .await?;

        rows.into_iter()
            .map(InstallationRow::into_installation)
            .collect()
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
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE installation
             SET access_token = ?1, refresh_token = ?2, updated_at = ?3
             WHERE id = ?4",
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(&now)
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("installation {id} not found")));
        }
        Ok(())
    }

    /// Replace the settings map on an installation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the installation does not exist and
    /// `AppError::Db` if the update fails.
    pub async fn update_settings(&self, id: &str, settings: &InstallationSettings) -> Result<()> {
        let payload = serde_json::to_string(settings)
            .map_err(|e| AppError::Db(format!("settings serialization: {e}")))?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE installation SET settings = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(&payload)
        .bind(&now)
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("installation {id} not found")));
        }
        Ok(())
    }

    /// Record a successful token verification timestamp.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn touch_last_active(&self, id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE installation SET last_active_at = ?1 WHERE id = ?2")
            .bind(&now)
            .bind(id)
            .execute(self.db.as_ref())
            .await?;
        Ok(())
    }

    /// Delete an installation record.
    ///
    /// The row carries the webhook secret and token pair, so deletion
    /// invalidates all of them in one statement.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the installation does not exist and
    /// `AppError::Db` if the delete fails.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM installation WHERE id = ?1")
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("installation {id} not found")));
        }
        Ok(())
    }
}
