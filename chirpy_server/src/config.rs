//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use chirpy::{AuthConfig, SessionPolicy, auth::AccessTokenPolicy, db::DatabaseConfig};
use chrono::Duration;
use std::net::SocketAddr;

/// Default bind address when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Upper bound for either access token lifetime setting (one year)
pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Token lifetimes and session policy
    pub tokens: TokenConfig,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Polka webhook API key (required)
    pub polka_key: String,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("polka_key", &"<redacted>")
            .finish()
    }
}

/// Token lifetimes and session policy
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Access token lifetime when the client does not ask for one
    pub access_token_ttl_secs: i64,
    /// Largest access token lifetime a client may request
    pub access_token_max_ttl_secs: i64,
    /// Refresh token lifetime in days
    pub refresh_token_ttl_days: i64,
    /// Refresh token reuse policy at login
    pub session_policy: SessionPolicy,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: 3600,
            access_token_max_ttl_secs: 3600,
            refresh_token_ttl_days: 60,
            session_policy: SessionPolicy::PerLogin,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        // Bind address
        let bind = match bind_override {
            Some(bind) => bind,
            None => {
                let raw = std::env::var("SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
                raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("'{raw}' is not an IP:PORT address"),
                })?
            }
        };

        // Database configuration
        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -base64 64".to_string(),
        })?;

        let polka_key = std::env::var("POLKA_KEY").map_err(|_| ConfigError::MissingRequired {
            var: "POLKA_KEY".to_string(),
            hint: "Copy the API key from the Polka dashboard".to_string(),
        })?;

        let security = SecurityConfig {
            jwt_secret,
            polka_key,
        };

        // Token lifetimes
        let defaults = TokenConfig::default();
        let session_policy = match std::env::var("SESSION_POLICY") {
            Ok(raw) => raw
                .parse()
                .map_err(|reason| ConfigError::Invalid {
                    var: "SESSION_POLICY".to_string(),
                    reason,
                })?,
            Err(_) => defaults.session_policy,
        };

        let tokens = TokenConfig {
            access_token_ttl_secs: parse_env_or(
                "ACCESS_TOKEN_TTL_SECS",
                defaults.access_token_ttl_secs,
            ),
            access_token_max_ttl_secs: parse_env_or(
                "ACCESS_TOKEN_MAX_TTL_SECS",
                defaults.access_token_max_ttl_secs,
            ),
            refresh_token_ttl_days: parse_env_or(
                "REFRESH_TOKEN_TTL_DAYS",
                defaults.refresh_token_ttl_days,
            ),
            session_policy,
        };

        Ok(ServerConfig {
            bind,
            database,
            security,
            tokens,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters".to_string(),
            });
        }

        if self.security.polka_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "POLKA_KEY".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.tokens.access_token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_TTL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.tokens.access_token_max_ttl_secs < self.tokens.access_token_ttl_secs {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_MAX_TTL_SECS".to_string(),
                reason: format!(
                    "Must be at least the default access token lifetime ({})",
                    self.tokens.access_token_ttl_secs
                ),
            });
        }

        if self.tokens.access_token_max_ttl_secs > MAX_ACCESS_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_MAX_TTL_SECS".to_string(),
                reason: format!("Must be at most {MAX_ACCESS_TOKEN_TTL_SECS}"),
            });
        }

        // Bounded so the conversion to a `chrono::Duration` cannot overflow.
        if !(1..=36_500).contains(&self.tokens.refresh_token_ttl_days) {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_DAYS".to_string(),
                reason: "Must be between 1 and 36500".to_string(),
            });
        }

        Ok(())
    }

    /// Settings handed to the session layer
    pub fn to_auth_config(&self) -> Result<AuthConfig, ConfigError> {
        let access_ttl = seconds("ACCESS_TOKEN_TTL_SECS", self.tokens.access_token_ttl_secs)?;
        let access_max_ttl = seconds(
            "ACCESS_TOKEN_MAX_TTL_SECS",
            self.tokens.access_token_max_ttl_secs,
        )?;
        let refresh_ttl = Duration::try_days(self.tokens.refresh_token_ttl_days).ok_or_else(|| {
            ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_DAYS".to_string(),
                reason: "Out of range".to_string(),
            }
        })?;

        let mut auth = AuthConfig::new(
            self.security.jwt_secret.as_bytes(),
            self.security.polka_key.clone(),
        );
        auth.access_token = AccessTokenPolicy {
            default_ttl: access_ttl,
            max_ttl: access_max_ttl,
        };
        auth.refresh_token_ttl = refresh_ttl;
        auth.session_policy = self.tokens.session_policy;
        Ok(auth)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn seconds(var: &str, value: i64) -> Result<Duration, ConfigError> {
    Duration::try_seconds(value).ok_or_else(|| ConfigError::Invalid {
        var: var.to_string(),
        reason: "Out of range".to_string(),
    })
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
