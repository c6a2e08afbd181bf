//! Authentication module providing identity and session-token management.
//!
//! This module implements:
//! - Argon2id password hashing
//! - HS256 JWT access tokens (1-hour default, clamped to a configured ceiling)
//! - Opaque, revocable refresh tokens (60-day default)
//! - `Bearer` and `ApiKey` credential extraction from request headers
//!
//! ## Example
//!
//! ```no_run
//! use chirpy::auth::{AuthConfig, AuthManager, LoginRequest, RegisterRequest};
//! use chirpy::db::{Database, PgRefreshTokenRepository, PgUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(PgUserRepository::new(db.pool().clone())),
//!         Arc::new(PgRefreshTokenRepository::new(db.pool().clone())),
//!         AuthConfig::new("jwt_secret_at_least_32_characters!!", "polka_key"),
//!     );
//!
//!     auth.register(RegisterRequest {
//!         email: "walt@breakingbad.com".to_string(),
//!         password: "0423404234".to_string(),
//!     })
//!     .await?;
//!
//!     let session = auth
//!         .login(LoginRequest {
//!             email: "walt@breakingbad.com".to_string(),
//!             password: "0423404234".to_string(),
//!             expires_in_seconds: None,
//!         })
//!         .await?;
//!     println!("Logged in as {}", session.user.id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod errors;
pub mod jwt;
pub mod manager;
pub mod models;
pub mod password;
pub mod refresh;

pub use config::{AuthConfig, SessionPolicy};
pub use errors::{AuthError, AuthResult};
pub use jwt::{AccessTokenCodec, AccessTokenPolicy};
pub use manager::AuthManager;
pub use models::{
    AccessTokenClaims, LoginOutcome, LoginRequest, RefreshToken, RegisterRequest, User,
    UserCredentials, UserId,
};
pub use refresh::RefreshTokens;
