//! Opaque refresh tokens and their lifecycle.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rand::{TryRngCore, rngs::OsRng};
use std::sync::Arc;

use super::{
    errors::{AuthError, AuthResult},
    models::{RefreshToken, UserId},
};
use crate::db::RefreshTokenRepository;

/// Random bytes per refresh token (64 hex characters on the wire)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Default refresh token lifetime
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::days(60);

/// Generate a new refresh token value from the OS CSPRNG.
///
/// Uniqueness rests on the 256 bits of entropy; there is no retry loop.
pub fn generate_refresh_token() -> AuthResult<String> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Refresh token operations over a [`RefreshTokenRepository`].
///
/// This is the only place that decides whether a refresh token is usable.
#[derive(Clone)]
pub struct RefreshTokens {
    repo: Arc<dyn RefreshTokenRepository>,
}

impl RefreshTokens {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { repo }
    }

    /// Mint and persist a token for `user_id` expiring after `ttl`.
    pub async fn create(&self, user_id: UserId, ttl: Duration) -> AuthResult<RefreshToken> {
        let now = Utc::now();
        let record = RefreshToken {
            token: generate_refresh_token()?,
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
            revoked_at: None,
        };

        self.repo.insert(&record).await?;
        info!("Created refresh token for user {user_id}, expires {}", record.expires_at);

        Ok(record)
    }

    /// Resolve the owner of a refresh token.
    pub async fn lookup_owner(&self, token: &str) -> AuthResult<UserId> {
        self.lookup_owner_at(token, Utc::now()).await
    }

    /// Resolve the owner of a refresh token as of `now`.
    ///
    /// # Errors
    ///
    /// * `AuthError::NotFound` - no such token
    /// * `AuthError::Revoked` - token was revoked earlier
    /// * `AuthError::Expired` - `now >= expires_at`; the token is revoked on the way out
    pub async fn lookup_owner_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<UserId> {
        let record = self
            .repo
            .find_by_token(token)
            .await?
            .ok_or(AuthError::NotFound)?;

        if record.revoked_at.is_some() {
            return Err(AuthError::Revoked);
        }

        if now >= record.expires_at {
            self.repo.revoke(token, now).await?;
            debug!("Refresh token for user {} used after expiry", record.user_id);
            return Err(AuthError::Expired);
        }

        Ok(record.user_id)
    }

    /// Revoke a token. Revoking twice is not an error.
    ///
    /// # Errors
    ///
    /// * `AuthError::NotFound` - no such token
    pub async fn revoke(&self, token: &str) -> AuthResult<()> {
        if self.repo.revoke(token, Utc::now()).await? {
            Ok(())
        } else {
            Err(AuthError::NotFound)
        }
    }

    /// Newest active token owned by `user_id`, if any.
    pub async fn find_active_for_user(&self, user_id: UserId) -> AuthResult<Option<RefreshToken>> {
        self.repo.find_active_by_user(user_id, Utc::now()).await
    }
}
