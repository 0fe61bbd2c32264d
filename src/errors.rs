//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or signing-key failure.
    Config(String),
    /// Persistence failure when interacting with `SQLite`.
    Db(String),
    /// Malformed request payload or missing required fields.
    Validation(String),
    /// Signature or token verification failure.
    Auth(String),
    /// OAuth code/token is malformed, expired, or already consumed.
    InvalidGrant(String),
    /// OAuth request carries an unsupported or missing grant type.
    InvalidRequest(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Downstream broker delivery failure.
    Publish(String),
    /// Unexpected internal failure.
    Internal(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
            Self::Auth(msg) => write!(f, "auth: {msg}"),
            Self::InvalidGrant(msg) => write!(f, "invalid_grant: {msg}"),
            Self::InvalidRequest(msg) => write!(f, "invalid_request: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Publish(msg) => write!(f, "publish: {msg}"),
            Self::Internal(msg) => write!(f, "internal: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("invalid json: {err}"))
    }
}
