//! Token authority: authorization codes, access/refresh tokens, and
//! webhook secret issuance.
//!
//! Each handshake moves through AUTHORIZED (code issued) → EXCHANGED
//! (token pair minted, code invalidated) → ACTIVE (access token
//! verifiable) → EXPIRED/REVOKED. Codes and tokens are HS256 JWTs signed
//! with the process-wide key; a code is single-use, enforced through a
//! consumed-`jti` set.

use std::collections::HashMap;

use base64::Engine as _;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::directory::SharedDirectory;
use crate::models::installation::Installation;
use crate::{AppError, Result};

/// Grant type literal accepted by the code exchange.
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
/// Grant type literal accepted by the refresh exchange.
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

const SCOPE: &str = "conversations:read conversations:write";
const WEBHOOK_SECRET_BYTES: usize = 32;

/// Discriminator for the three token kinds this authority mints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum TokenUse {
    Code,
    Access,
    Refresh,
}

/// Signed claim set shared by codes, access tokens, and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    subdomain: String,
    user_id: String,
    app_id: String,
    #[serde(rename = "use")]
    token_use: TokenUse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    jti: String,
    iat: i64,
    exp: i64,
}

/// Token pair returned from a successful exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TokenGrant {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived token for minting fresh access tokens.
    pub refresh_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Granted scope string.
    pub scope: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Issues and verifies the signed credentials gating the webhook trust
/// boundary.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetimes: TokenConfig,
    directory: SharedDirectory,
    /// Consumed authorization-code `jti`s mapped to their expiry, pruned
    /// as codes age out.
    consumed_codes: Mutex<HashMap<String, i64>>,
}

impl TokenAuthority {
    /// Create an authority bound to the process signing key.
    #[must_use]
    pub fn new(signing_key: &str, lifetimes: TokenConfig, directory: SharedDirectory) -> Self {
        Self {
            encoding: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding: DecodingKey::from_secret(signing_key.as_bytes()),
            lifetimes,
            directory,
            consumed_codes: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a short-lived, single-use authorization code.
    ///
    /// The caller-supplied `state` is embedded and round-tripped
    /// unmodified so the caller can perform its own CSRF check.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the missing fields if any of
    /// the four inputs is empty, and `AppError::Internal` if signing
    /// fails.
    pub fn issue_authorization_code(
        &self,
        subdomain: &str,
        user_id: &str,
        app_id: &str,
        state: &str,
    ) -> Result<String> {
        let mut missing = Vec::new();
        if subdomain.is_empty() {
            missing.push("subdomain");
        }
        if user_id.is_empty() {
            missing.push("user_id");
        }
        if app_id.is_empty() {
            missing.push("app_id");
        }
        if state.is_empty() {
            missing.push("state");
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        self.encode(
            subdomain,
            user_id,
            app_id,
            TokenUse::Code,
            Some(state.to_owned()),
            self.lifetimes.code_ttl_seconds,
        )
    }

    /// Exchange an authorization code for an access/refresh token pair.
    ///
    /// Creates the installation record for a first-time triple (with a
    /// fresh webhook secret) or rotates tokens on the existing one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidRequest` for a wrong grant type and
    /// `AppError::InvalidGrant` if the code is malformed, expired, of the
    /// wrong kind, or already consumed.
    pub async fn exchange_code(&self, code: &str, grant_type: &str) -> Result<TokenGrant> {
        if grant_type != GRANT_AUTHORIZATION_CODE {
            return Err(AppError::InvalidRequest(format!(
                "unsupported grant_type: {grant_type}"
            )));
        }

        let claims = self
            .decode(code)
            .map_err(|_| AppError::InvalidGrant("authorization code is invalid or expired".into()))?;
        if claims.token_use != TokenUse::Code {
            return Err(AppError::InvalidGrant(
                "presented token is not an authorization code".into(),
            ));
        }

        self.consume_code(&claims).await?;

        let installation = match self
            .directory
            .find_by_triple(&claims.subdomain, &claims.user_id, &claims.app_id)
            .await
        {
            Some(existing) => existing,
            None => {
                let installation = Installation::new(
                    claims.subdomain.clone(),
                    claims.user_id.clone(),
                    claims.app_id.clone(),
                    issue_webhook_secret(),
                );
                self.directory.insert(installation).await?
            }
        };

        let access = self.encode(
            &claims.subdomain,
            &claims.user_id,
            &claims.app_id,
            TokenUse::Access,
            None,
            self.lifetimes.access_ttl_seconds,
        )?;
        let refresh = self.encode(
            &claims.subdomain,
            &claims.user_id,
            &claims.app_id,
            TokenUse::Refresh,
            None,
            self.lifetimes.refresh_ttl_seconds,
        )?;

        self.directory
            .update_tokens(&installation.id, &access, Some(&refresh))
            .await?;

        debug!(installation_id = %installation.id, "authorization code exchanged");

        Ok(TokenGrant {
            access_token: access,
            refresh_token: refresh,
            token_type: "Bearer".into(),
            scope: SCOPE.into(),
            expires_in: self.lifetimes.access_ttl_seconds,
        })
    }

    /// Mint a fresh access token from a refresh token.
    ///
    /// The refresh token itself is kept; only the access token rotates.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidGrant` if the refresh token is
    /// malformed, expired, of the wrong kind, or does not match the one
    /// stored on the installation.
    pub async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenGrant> {
        let claims = self
            .decode(refresh_token)
            .map_err(|_| AppError::InvalidGrant("refresh token is invalid or expired".into()))?;
        if claims.token_use != TokenUse::Refresh {
            return Err(AppError::InvalidGrant(
                "presented token is not a refresh token".into(),
            ));
        }

        let installation = self
            .directory
            .find_by_triple(&claims.subdomain, &claims.user_id, &claims.app_id)
            .await
            .ok_or_else(|| AppError::InvalidGrant("no installation for refresh token".into()))?;

        if installation.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AppError::InvalidGrant(
                "refresh token does not match the stored grant".into(),
            ));
        }

        let access = self.encode(
            &claims.subdomain,
            &claims.user_id,
            &claims.app_id,
            TokenUse::Access,
            None,
            self.lifetimes.access_ttl_seconds,
        )?;

        self.directory
            .update_tokens(&installation.id, &access, Some(refresh_token))
            .await?;

        Ok(TokenGrant {
            access_token: access,
            refresh_token: refresh_token.to_owned(),
            token_type: "Bearer".into(),
            scope: SCOPE.into(),
            expires_in: self.lifetimes.access_ttl_seconds,
        })
    }

    /// Verify an access token and resolve its installation.
    ///
    /// Beyond signature and expiry, the decoded triple must resolve to a
    /// live installation whose stored access token literally matches the
    /// presented one — a signed token does not survive installation
    /// deletion or token rotation. Records last-active best-effort.
    ///
    /// Returns `None` on any failure; callers cannot observe why.
    pub async fn verify_access_token(&self, token: &str) -> Option<Installation> {
        let claims = self.decode(token).ok()?;
        if claims.token_use != TokenUse::Access {
            return None;
        }

        let installation = self
            .directory
            .find_by_triple(&claims.subdomain, &claims.user_id, &claims.app_id)
            .await?;

        if installation.access_token != token {
            return None;
        }

        self.directory.touch_last_active(&installation.id).await;
        Some(installation)
    }

    /// Mark an authorization code consumed, rejecting reuse.
    async fn consume_code(&self, claims: &Claims) -> Result<()> {
        let now = Utc::now().timestamp();
        let mut consumed = self.consumed_codes.lock().await;
        consumed.retain(|_, exp| *exp > now);
        if consumed.contains_key(&claims.jti) {
            return Err(AppError::InvalidGrant(
                "authorization code already consumed".into(),
            ));
        }
        consumed.insert(claims.jti.clone(), claims.exp);
        Ok(())
    }

    fn encode(
        &self,
        subdomain: &str,
        user_id: &str,
        app_id: &str,
        token_use: TokenUse,
        state: Option<String>,
        ttl_seconds: u64,
    ) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl_seconds)
            .map_err(|_| AppError::Internal("token ttl exceeds i64".into()))?;
        let claims = Claims {
            subdomain: subdomain.to_owned(),
            user_id: user_id.to_owned(),
            app_id: app_id.to_owned(),
            token_use,
            state,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AppError::Internal(format!("token signing failed: {err}")))
    }

    fn decode(&self, token: &str) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

/// Generate a fresh 256-bit webhook signing secret, base64-encoded.
#[must_use]
pub fn issue_webhook_secret() -> String {
    let mut bytes = [0u8; WEBHOOK_SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
