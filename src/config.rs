//! Global configuration parsing, validation, and signing-key loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Minimum acceptable length, in bytes, for the token signing key.
const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Downstream broker connectivity settings.
///
/// When `url` is absent the server runs without a broker and domain
/// events are counted but not delivered.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BrokerConfig {
    /// Endpoint that receives published domain events as JSON.
    #[serde(default)]
    pub url: Option<String>,
    /// Capacity of the buffered publish queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Per-request delivery timeout.
    #[serde(default = "default_broker_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: None,
            queue_capacity: default_queue_capacity(),
            request_timeout_seconds: default_broker_timeout_seconds(),
        }
    }
}

/// Lifetimes for the tokens minted by the token authority.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TokenConfig {
    /// Authorization code lifetime.
    #[serde(default = "default_code_ttl_seconds")]
    pub code_ttl_seconds: u64,
    /// Access token lifetime.
    #[serde(default = "default_access_ttl_seconds")]
    pub access_ttl_seconds: u64,
    /// Refresh token lifetime.
    #[serde(default = "default_refresh_ttl_seconds")]
    pub refresh_ttl_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            code_ttl_seconds: default_code_ttl_seconds(),
            access_ttl_seconds: default_access_ttl_seconds(),
            refresh_ttl_seconds: default_refresh_ttl_seconds(),
        }
    }
}

fn default_queue_capacity() -> usize {
    256
}

fn default_broker_timeout_seconds() -> u64 {
    5
}

fn default_code_ttl_seconds() -> u64 {
    300
}

fn default_access_ttl_seconds() -> u64 {
    3600
}

fn default_refresh_ttl_seconds() -> u64 {
    2_592_000
}

fn default_http_port() -> u16 {
    8080
}

fn default_ingress_timeout_seconds() -> u64 {
    10
}

fn default_database_path() -> PathBuf {
    PathBuf::from("deskbridge.db")
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port for the webhook and OAuth surfaces.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Path to the `SQLite` database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Internal processing budget per webhook request.
    #[serde(default = "default_ingress_timeout_seconds")]
    pub ingress_timeout_seconds: u64,
    /// Downstream broker settings.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Token lifetime settings.
    #[serde(default)]
    pub tokens: TokenConfig,
    /// HMAC key for signing authorization codes and tokens
    /// (populated at runtime, never from the TOML file).
    #[serde(skip)]
    pub signing_key: String,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the token signing key from OS keychain with env-var fallback.
    ///
    /// Tries the `deskbridge` keyring service first, then falls back to
    /// the `DESKBRIDGE_SIGNING_KEY` environment variable. A missing or
    /// short key prevents the process from serving any traffic.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no key is available or the key is
    /// shorter than 256 bits.
    pub async fn load_signing_key(&mut self) -> Result<()> {
        let key = load_credential("signing_key", "DESKBRIDGE_SIGNING_KEY").await?;
        if key.len() < MIN_SIGNING_KEY_BYTES {
            return Err(AppError::Config(format!(
                "signing key must be at least {MIN_SIGNING_KEY_BYTES} bytes"
            )));
        }
        self.signing_key = key;
        Ok(())
    }

    /// Internal processing budget per webhook request.
    #[must_use]
    pub fn ingress_timeout(&self) -> Duration {
        Duration::from_secs(self.ingress_timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.broker.queue_capacity == 0 {
            return Err(AppError::Config(
                "broker.queue_capacity must be greater than zero".into(),
            ));
        }

        if self.tokens.code_ttl_seconds == 0
            || self.tokens.access_ttl_seconds == 0
            || self.tokens.refresh_ttl_seconds == 0
        {
            return Err(AppError::Config(
                "token lifetimes must be greater than zero".into(),
            ));
        }

        if let Some(ref url) = self.broker.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "broker.url must be an http(s) endpoint, got {url}"
                )));
            }
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // Try OS keychain first via spawn_blocking (keyring is synchronous I/O).
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new("deskbridge", &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    // Fallback to environment variable.
    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}
