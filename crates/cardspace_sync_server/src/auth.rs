//! Authentication support for the sync server.
//!
//! This module provides owner tokens signed with HMAC-SHA256. Tokens carry
//! their issue time for expiration checking.
//!
//! ## Token Format
//!
//! `<owner_id>.<issued_at>.<signature>` where `issued_at` is Unix millis in
//! decimal and `signature` is the lowercase hex HMAC-SHA256 of
//! `<owner_id>.<issued_at>`.

use crate::error::{ServerError, ServerResult};
use cardspace_core::OwnerId;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt::Write as _;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    pub secret: Vec<u8>,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            token_expiry: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Sets the token expiration duration.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

/// Issues and checks owner tokens.
#[derive(Clone)]
pub struct TokenValidator {
    config: AuthConfig,
}

impl TokenValidator {
    /// Creates a new token validator.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issues a token for `owner`, valid from now.
    pub fn create_token(&self, owner: &OwnerId) -> ServerResult<String> {
        self.create_token_at(owner, Utc::now())
    }

    /// Issues a token for `owner` as of `issued_at`.
    pub fn create_token_at(&self, owner: &OwnerId, issued_at: DateTime<Utc>) -> ServerResult<String> {
        let payload = format!("{}.{}", owner, issued_at.timestamp_millis());
        let signature = self.sign(payload.as_bytes())?;
        Ok(format!("{payload}.{}", to_hex(&signature)))
    }

    /// Validates a token for `owner` against the current time.
    pub fn validate_token(&self, token: &str, owner: &OwnerId) -> ServerResult<()> {
        self.validate_token_at(token, owner, Utc::now())
    }

    /// Validates a token for `owner` as of `now`.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` for malformed, forged or expired tokens;
    /// `NotAuthorized` for a valid token issued to another owner.
    pub fn validate_token_at(
        &self,
        token: &str,
        owner: &OwnerId,
        now: DateTime<Utc>,
    ) -> ServerResult<()> {
        let mut parts = token.rsplitn(3, '.');
        let (Some(signature), Some(issued), Some(token_owner)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(ServerError::AuthenticationFailed("malformed token".into()));
        };

        let signature = from_hex(signature)
            .ok_or_else(|| ServerError::AuthenticationFailed("malformed signature".into()))?;
        let payload_len = token.len() - signature.len() * 2 - 1;
        self.mac()?
            .chain_update(&token.as_bytes()[..payload_len])
            .verify_slice(&signature)
            .map_err(|_| ServerError::AuthenticationFailed("invalid signature".into()))?;

        let issued: i64 = issued
            .parse()
            .map_err(|_| ServerError::AuthenticationFailed("malformed timestamp".into()))?;
        let expiry = i64::try_from(self.config.token_expiry.as_millis()).unwrap_or(i64::MAX);
        if now.timestamp_millis() > issued.saturating_add(expiry) {
            return Err(ServerError::AuthenticationFailed("token expired".into()));
        }

        if token_owner != owner.as_str() {
            return Err(ServerError::NotAuthorized(format!(
                "token does not grant access to {owner}"
            )));
        }
        Ok(())
    }

    fn mac(&self) -> ServerResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.config.secret)
            .map_err(|e| ServerError::Internal(format!("invalid auth secret: {e}")))
    }

    fn sign(&self, data: &[u8]) -> ServerResult<[u8; 32]> {
        Ok(self.mac()?.chain_update(data).finalize().into_bytes().into())
    }
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
