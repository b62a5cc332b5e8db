use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;

/// Minimum HS256 secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("jwt secret must be at least {} bytes", MIN_SECRET_LEN)]
    WeakSecret,
    #[error("jwt ttl must be between 1 and {max} minutes, got {0}", max = MAX_TTL_MINUTES)]
    InvalidTtl(i64),
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
    #[error("jwt signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// JWT payload carried by session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

/// Mints bearer tokens for authenticated accounts.
pub trait TokenIssuer: Send + Sync {
    fn create_token(&self, account_id: Uuid) -> Result<String, TokenError>;
}

#[derive(Clone)]
pub struct JwtIssuer {
    encoding: EncodingKey,
    issuer: String,
    audience: String,
    ttl: TimeDuration,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtIssuer {
    /// Fails on a weak secret or a lifetime outside `1..=MAX_TTL_MINUTES`.
    pub fn new(cfg: &JwtConfig) -> Result<Self, TokenError> {
        let secret = cfg.secret.as_bytes();
        if secret.len() < MIN_SECRET_LEN || cfg.secret.trim().is_empty() {
            return Err(TokenError::WeakSecret);
        }
        if !(1..=MAX_TTL_MINUTES).contains(&cfg.ttl_minutes) {
            return Err(TokenError::InvalidTtl(cfg.ttl_minutes));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: TimeDuration::minutes(cfg.ttl_minutes),
        })
    }
}

impl TokenIssuer for JwtIssuer {
    fn create_token(&self, account_id: Uuid) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id = %account_id, "jwt signed");
        Ok(token)
    }
}
