//! # Chirpy
//!
//! Identity and session-token core for the Chirpy backend.
//!
//! Users authenticate with an email and password. A successful login yields
//! two credentials:
//!
//! - **Access token**: a short-lived HS256 JWT (issuer `chirpy`) naming the
//!   user in its subject. It is validated statelessly and presented as
//!   `Authorization: Bearer <jwt>` on protected endpoints.
//! - **Refresh token**: a 256-bit random, hex-encoded opaque token persisted
//!   with a 60-day expiry. It is exchanged for new access tokens until it is
//!   revoked or expires.
//!
//! Machine callers (the Polka payment webhook) present a shared key as
//! `Authorization: ApiKey <key>`.
//!
//! ## Core Modules
//!
//! - [`auth`]: Password hashing, token issue/validation, header extraction
//!   and the [`auth::AuthManager`] session service
//! - [`db`]: PostgreSQL pool, migrations and the user / refresh-token stores

/// Authentication, credentials and session management.
pub mod auth;
pub use auth::{AuthConfig, AuthError, AuthManager, AuthResult, SessionPolicy};

/// Database pool and repositories.
pub mod db;
pub use db::{Database, DatabaseConfig};
