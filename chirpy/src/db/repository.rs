//! Repository traits for the user and refresh-token stores.
//!
//! The session layer only talks to these traits, so it runs unchanged over
//! PostgreSQL in production and over the in-memory stores in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::timeouts::{TimeoutError, with_default_timeout};
use crate::auth::{AuthError, AuthResult, RefreshToken, User, UserCredentials, UserId};

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    ///
    /// Fails with `AuthError::EmailTaken` if the email is already registered.
    async fn create_user(&self, email: &str, password_hash: &str) -> AuthResult<User>;

    /// Find user and password hash by email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserCredentials>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Mark a user as Chirpy Red; `false` if the user does not exist
    async fn upgrade_to_red(&self, user_id: UserId) -> AuthResult<bool>;
}

/// Trait for refresh token repository operations
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Store a new refresh token
    async fn insert(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Find a refresh token by value
    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>>;

    /// Newest token of `user_id` that is neither revoked nor expired at `now`
    async fn find_active_by_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<RefreshToken>>;

    /// Set `revoked_at` if unset; `false` if the token does not exist
    async fn revoke(&self, token: &str, at: DateTime<Utc>) -> AuthResult<bool>;
}

/// Default PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        email: row.get("email"),
        is_chirpy_red: row.get("is_chirpy_red"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, email: &str, password_hash: &str) -> AuthResult<User> {
        let result = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO users (id, email, hashed_password)
                VALUES ($1, $2, $3)
                RETURNING id, created_at, updated_at, email, is_chirpy_red
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)),
            Err(TimeoutError::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Err(AuthError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserCredentials>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, created_at, updated_at, email, is_chirpy_red, hashed_password
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| UserCredentials {
            user: user_from_row(&r),
            password_hash: r.get("hashed_password"),
        }))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, created_at, updated_at, email, is_chirpy_red FROM users WHERE id = $1",
            )
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn upgrade_to_red(&self, user_id: UserId) -> AuthResult<bool> {
        let result = with_default_timeout(
            sqlx::query("UPDATE users SET is_chirpy_red = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Default PostgreSQL implementation of `RefreshTokenRepository`
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn refresh_token_from_row(row: &PgRow) -> RefreshToken {
    RefreshToken {
        token: row.get("token"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        expires_at: row.get("expires_at"),
        revoked_at: row.get("revoked_at"),
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> AuthResult<()> {
        with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&token.token)
            .bind(token.user_id)
            .bind(token.created_at)
            .bind(token.updated_at)
            .bind(token.expires_at)
            .bind(token.revoked_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
                FROM refresh_tokens
                WHERE token = $1
                "#,
            )
            .bind(token)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(refresh_token_from_row))
    }

    async fn find_active_by_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<RefreshToken>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
                FROM refresh_tokens
                WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > $2
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(user_id)
            .bind(now)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(refresh_token_from_row))
    }

    async fn revoke(&self, token: &str, at: DateTime<Utc>) -> AuthResult<bool> {
        let result = with_default_timeout(
            sqlx::query(
                r#"
                UPDATE refresh_tokens
                SET revoked_at = COALESCE(revoked_at, $2), updated_at = $2
                WHERE token = $1
                "#,
            )
            .bind(token)
            .bind(at)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
