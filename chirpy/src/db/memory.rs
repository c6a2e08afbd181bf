//! In-memory stores for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{RefreshTokenRepository, UserRepository};
use crate::auth::{AuthError, AuthResult, RefreshToken, User, UserCredentials, UserId};

/// `UserRepository` backed by a map keyed by user ID
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, UserCredentials>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, email: &str, password_hash: &str) -> AuthResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|c| c.user.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            is_chirpy_red: false,
        };
        users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserCredentials>> {
        let users = self.users.read().await;
        Ok(users.values().find(|c| c.user.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|c| c.user.clone()))
    }

    async fn upgrade_to_red(&self, user_id: UserId) -> AuthResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&user_id) {
            Some(creds) => {
                creds.user.is_chirpy_red = true;
                creds.user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// `RefreshTokenRepository` backed by a map keyed by token value
#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> AuthResult<()> {
        self.tokens
            .write()
            .await
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn find_active_by_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<RefreshToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_active_at(now))
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn revoke(&self, token: &str, at: DateTime<Utc>) -> AuthResult<bool> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token) {
            Some(record) => {
                record.revoked_at.get_or_insert(at);
                record.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create_user("walt@breakingbad.com", "hash").await.unwrap();
        assert!(!user.is_chirpy_red);

        let found = repo.find_by_email("walt@breakingbad.com").await.unwrap().unwrap();
        assert_eq!(found.user, user);
        assert_eq!(found.password_hash, "hash");

        assert_eq!(repo.find_by_id(user.id).await.unwrap(), Some(user));
        assert!(repo.find_by_email("nobody@x.io").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let repo = InMemoryUserRepository::new();
        repo.create_user("a@b.io", "h1").await.unwrap();
        let err = repo.create_user("a@b.io", "h2").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_upgrade_to_red() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create_user("a@b.io", "h").await.unwrap();

        assert!(repo.upgrade_to_red(user.id).await.unwrap());
        assert!(repo.find_by_id(user.id).await.unwrap().unwrap().is_chirpy_red);
        assert!(!repo.upgrade_to_red(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_keeps_first_timestamp() {
        let repo = InMemoryRefreshTokenRepository::new();
        let now = Utc::now();
        let token = RefreshToken {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            expires_at: now + Duration::days(1),
            revoked_at: None,
        };
        repo.insert(&token).await.unwrap();

        assert!(repo.revoke("t", now).await.unwrap());
        assert!(repo.revoke("t", now + Duration::minutes(1)).await.unwrap());
        assert_eq!(repo.find_by_token("t").await.unwrap().unwrap().revoked_at, Some(now));
        assert!(!repo.revoke("missing", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_active_by_user_ignores_expired() {
        let repo = InMemoryRefreshTokenRepository::new();
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let expired = RefreshToken {
            token: "old".to_string(),
            user_id,
            created_at: now - Duration::days(61),
            updated_at: now - Duration::days(61),
            expires_at: now - Duration::days(1),
            revoked_at: None,
        };
        repo.insert(&expired).await.unwrap();

        assert!(repo.find_active_by_user(user_id, now).await.unwrap().is_none());
    }
}
