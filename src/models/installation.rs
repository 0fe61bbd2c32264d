//! Installation model — one record per helpdesk-account/app pairing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Feature flags controlling downstream enrichment triggers.
///
/// Unknown keys are preserved round-trip so that settings written by a
/// newer dashboard version survive an older server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct InstallationSettings {
    /// Whether customer messages trigger sentiment analysis requests.
    #[serde(default)]
    pub sentiment_enabled: bool,
    /// Whether customer messages trigger response suggestion requests.
    #[serde(default)]
    pub suggestions_enabled: bool,
    /// Pass-through for settings this server does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A bound pairing between this system and one helpdesk account/app.
///
/// Owns the webhook signing secret and the currently valid token pair.
/// Deleting an installation invalidates its secret and tokens in the
/// same operation — there is no window with orphaned valid tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Installation {
    /// Unique record identifier (opaque).
    pub id: String,
    /// Helpdesk account subdomain that authorized this installation.
    pub subdomain: String,
    /// Marketplace app identifier.
    pub app_id: String,
    /// Helpdesk user who authorized the installation.
    pub user_id: String,
    /// Random secret used to verify webhook signatures (base64, 256-bit).
    pub webhook_secret: String,
    /// Currently valid access token.
    pub access_token: String,
    /// Currently valid refresh token, if one was issued.
    pub refresh_token: Option<String>,
    /// Feature flags for downstream enrichment.
    pub settings: InstallationSettings,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Last successful token verification, recorded best-effort.
    pub last_active_at: Option<DateTime<Utc>>,
}

impl Installation {
    /// Construct a new installation with a generated identifier.
    ///
    /// Tokens start empty; the token authority fills them during the
    /// code exchange that creates the record.
    #[must_use]
    pub fn new(subdomain: String, user_id: String, app_id: String, webhook_secret: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            subdomain,
            app_id,
            user_id,
            webhook_secret,
            access_token: String::new(),
            refresh_token: None,
            settings: InstallationSettings::default(),
            created_at: now,
            updated_at: now,
            last_active_at: None,
        }
    }
}
