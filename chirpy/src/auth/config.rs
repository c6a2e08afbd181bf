//! Authentication configuration.

use chrono::Duration;
use std::str::FromStr;

use super::{jwt::AccessTokenPolicy, refresh::DEFAULT_REFRESH_TOKEN_TTL};

/// How many refresh tokens a user may hold at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPolicy {
    /// Every login mints its own refresh token; each is revoked independently
    #[default]
    PerLogin,
    /// Login hands back an existing active token and only mints one when none is left
    ReuseActive,
}

impl FromStr for SessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_login" | "per-login" => Ok(SessionPolicy::PerLogin),
            "reuse_active" | "reuse-active" => Ok(SessionPolicy::ReuseActive),
            other => Err(format!("unknown session policy '{other}'")),
        }
    }
}

/// Everything the session layer needs from configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for access tokens
    pub jwt_secret: Vec<u8>,
    /// Shared key presented by webhook callers
    pub webhook_api_key: String,
    /// Access token lifetime bounds
    pub access_token: AccessTokenPolicy,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Refresh token reuse policy at login
    pub session_policy: SessionPolicy,
}

impl AuthConfig {
    /// Configuration with default lifetimes and the per-login session policy.
    pub fn new(jwt_secret: impl Into<Vec<u8>>, webhook_api_key: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            webhook_api_key: webhook_api_key.into(),
            access_token: AccessTokenPolicy::default(),
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            session_policy: SessionPolicy::default(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("webhook_api_key", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("session_policy", &self.session_policy)
            .finish()
    }
}
