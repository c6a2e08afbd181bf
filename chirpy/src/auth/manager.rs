//! Authentication manager implementation.

use chrono::Duration;
use http::HeaderMap;
use log::{debug, info, warn};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::{
    config::{AuthConfig, SessionPolicy},
    credentials::{api_key, bearer_token},
    errors::{AuthError, AuthResult},
    jwt::AccessTokenCodec,
    models::{LoginOutcome, LoginRequest, RegisterRequest, User, UserId},
    password::{DUMMY_PASSWORD_HASH, hash_password, verify_password},
    refresh::RefreshTokens,
};
use crate::db::{RefreshTokenRepository, UserRepository};

/// Authentication manager
///
/// Immutable after construction; share it behind an `Arc`. All durable state
/// lives in the two repositories.
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    refresh_tokens: RefreshTokens,
    access_tokens: AccessTokenCodec,
    webhook_api_key: String,
    refresh_token_ttl: Duration,
    session_policy: SessionPolicy,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - User store
    /// * `refresh_tokens` - Refresh token store
    /// * `config` - Secrets and token lifetimes
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            refresh_tokens: RefreshTokens::new(refresh_tokens),
            access_tokens: AccessTokenCodec::new(config.jwt_secret, config.access_token),
            webhook_api_key: config.webhook_api_key,
            refresh_token_ttl: config.refresh_token_ttl,
            session_policy: config.session_policy,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidEmail` - Email missing or malformed
    /// * `AuthError::WeakPassword` - Password too short
    /// * `AuthError::EmailTaken` - Email already exists
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        let email = request.email.trim();
        validate_email(email)?;
        validate_password(&request.password)?;

        let password_hash = hash_blocking(request.password).await?;
        let user = self.users.create_user(email, &password_hash).await?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Login a user
    ///
    /// Verifies the password, obtains a refresh token according to the
    /// session policy and issues an access token whose lifetime is the
    /// requested `expires_in_seconds` clamped by the access token policy.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No user with that email
    /// * `AuthError::InvalidCredentials` - Incorrect password
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginOutcome> {
        let Some(credentials) = self.users.find_by_email(request.email.trim()).await? else {
            // Same Argon2 cost as a wrong password.
            verify_blocking(request.password, DUMMY_PASSWORD_HASH.to_string()).await?;
            return Err(AuthError::UserNotFound);
        };

        if !verify_blocking(request.password, credentials.password_hash).await? {
            warn!("Failed login for user {}", credentials.user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let user = credentials.user;
        let refresh_token = self.session_refresh_token(user.id).await?;
        let requested = request.expires_in_seconds.and_then(Duration::try_seconds);
        let access_token = self.access_tokens.issue(user.id, requested)?;

        info!("User {} logged in", user.id);
        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Refresh token to hand out at login, per the session policy.
    async fn session_refresh_token(&self, user_id: UserId) -> AuthResult<String> {
        if self.session_policy == SessionPolicy::ReuseActive {
            if let Some(existing) = self.refresh_tokens.find_active_for_user(user_id).await? {
                debug!("Reusing active refresh token for user {user_id}");
                return Ok(existing.token);
            }
        }

        let created = self
            .refresh_tokens
            .create(user_id, self.refresh_token_ttl)
            .await?;
        Ok(created.token)
    }

    /// Mint a new access token from the refresh token in `Authorization: Bearer`.
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingCredential` - No `Authorization` header
    /// * `AuthError::Unauthorized` - Unknown, expired or revoked refresh token
    pub async fn refresh(&self, headers: &HeaderMap) -> AuthResult<String> {
        let token = bearer_token(headers)?;
        let user_id = self
            .refresh_tokens
            .lookup_owner(&token)
            .await
            .map_err(|e| collapse("refresh", e))?;

        self.access_tokens.issue(user_id, None)
    }

    /// Revoke the refresh token in `Authorization: Bearer`.
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingCredential` - No `Authorization` header
    /// * `AuthError::Unauthorized` - Unknown refresh token
    pub async fn revoke(&self, headers: &HeaderMap) -> AuthResult<()> {
        let token = bearer_token(headers)?;
        self.refresh_tokens
            .revoke(&token)
            .await
            .map_err(|e| collapse("revoke", e))?;

        info!("Refresh token revoked");
        Ok(())
    }

    /// Resolve the caller of a protected endpoint from its access token.
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingCredential` - No `Authorization` header
    /// * `AuthError::Unauthorized` - Any access token validation failure
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<UserId> {
        let token = bearer_token(headers)?;
        self.access_tokens
            .validate(&token)
            .map_err(|e| collapse("access token", e))
    }

    /// Check the `Authorization: ApiKey` credential of a webhook caller.
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthorized` - Key absent, malformed or wrong
    pub fn authorize_webhook(&self, headers: &HeaderMap) -> AuthResult<()> {
        let presented = api_key(headers).map_err(|e| collapse("webhook", e))?;

        let matches: bool = presented
            .as_bytes()
            .ct_eq(self.webhook_api_key.as_bytes())
            .into();

        if matches && !self.webhook_api_key.is_empty() {
            Ok(())
        } else {
            warn!("Webhook call with a wrong API key");
            Err(AuthError::Unauthorized)
        }
    }

    /// Public fields of a user
    pub async fn find_user(&self, user_id: UserId) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Fold credential failures into `Unauthorized`, keeping internal faults.
fn collapse(context: &str, err: AuthError) -> AuthError {
    if err.is_internal() {
        err
    } else {
        debug!("Rejected {context}: {err}");
        AuthError::Unauthorized
    }
}

async fn hash_blocking(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| AuthError::HashingFailed)?
}

async fn verify_blocking(password: String, hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|_| AuthError::HashingFailed)?
}

/// Validate email format
fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(AuthError::InvalidEmail("Email is required"));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AuthError::InvalidEmail("Email must look like name@domain")),
    }
}

/// Validate password strength
fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < 8 {
        return Err(AuthError::WeakPassword(
            "Password must be at least 8 characters",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
    use http::{HeaderValue, header::AUTHORIZATION};

    const SECRET: &str = "test_secret_key_for_jwt_signing_0001";
    const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

    fn manager_with(policy: SessionPolicy) -> AuthManager {
        let mut config = AuthConfig::new(SECRET, POLKA_KEY);
        config.session_policy = policy;
        AuthManager::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryRefreshTokenRepository::new()),
            config,
        )
    }

    fn authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            expires_in_seconds: None,
        }
    }

    async fn registered(auth: &AuthManager, email: &str) -> User {
        auth.register(RegisterRequest {
            email: email.to_string(),
            password: "04234".repeat(2),
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("walt@breakingbad.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("walt").is_err());
        assert!(validate_email("@breakingbad.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let auth = manager_with(SessionPolicy::PerLogin);
        let err = auth
            .login(login_request("nobody@example.com", "whatever1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let auth = manager_with(SessionPolicy::PerLogin);
        registered(&auth, "saul@bcs.com").await;

        let err = auth
            .login(login_request("saul@bcs.com", "not-the-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_per_login_policy_mints_a_token_each_time() {
        let auth = manager_with(SessionPolicy::PerLogin);
        registered(&auth, "walt@breakingbad.com").await;

        let first = auth.login(login_request("walt@breakingbad.com", "0423404234")).await.unwrap();
        let second = auth.login(login_request("walt@breakingbad.com", "0423404234")).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[tokio::test]
    async fn test_reuse_active_policy() {
        let auth = manager_with(SessionPolicy::ReuseActive);
        registered(&auth, "jesse@breakingbad.com").await;

        let first = auth.login(login_request("jesse@breakingbad.com", "0423404234")).await.unwrap();
        let second = auth.login(login_request("jesse@breakingbad.com", "0423404234")).await.unwrap();
        assert_eq!(first.refresh_token, second.refresh_token);

        // Once revoked, the next login gets a fresh token.
        auth.revoke(&authorization(&format!("Bearer {}", first.refresh_token)))
            .await
            .unwrap();
        let third = auth.login(login_request("jesse@breakingbad.com", "0423404234")).await.unwrap();
        assert_ne!(third.refresh_token, first.refresh_token);
    }

    #[tokio::test]
    async fn test_requested_ttl_is_clamped() {
        let auth = manager_with(SessionPolicy::PerLogin);
        registered(&auth, "skyler@breakingbad.com").await;

        let mut request = login_request("skyler@breakingbad.com", "0423404234");
        request.expires_in_seconds = Some(i64::MAX);
        let outcome = auth.login(request).await.unwrap();

        let user_id = auth.authenticate(&authorization(&format!("Bearer {}", outcome.access_token)));
        assert_eq!(user_id.unwrap(), outcome.user.id);
    }

    #[tokio::test]
    async fn test_authenticate_collapses_failures() {
        let auth = manager_with(SessionPolicy::PerLogin);
        let err = auth.authenticate(&authorization("Bearer not.a.jwt")).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));

        let err = auth.authenticate(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_token() {
        let auth = manager_with(SessionPolicy::PerLogin);
        let err = auth
            .refresh(&authorization(&format!("Bearer {}", "ab".repeat(32))))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let auth = manager_with(SessionPolicy::PerLogin);
        let err = auth.revoke(&authorization("Bearer nope")).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[test]
    fn test_authorize_webhook() {
        let auth = manager_with(SessionPolicy::PerLogin);
        assert!(auth.authorize_webhook(&authorization(&format!("ApiKey {POLKA_KEY}"))).is_ok());

        for headers in [
            HeaderMap::new(),
            authorization("ApiKey wrong-key"),
            authorization(&format!("Bearer {POLKA_KEY}")),
        ] {
            let err = auth.authorize_webhook(&headers).unwrap_err();
            assert!(matches!(err, AuthError::Unauthorized));
        }
    }

    #[test]
    fn test_empty_configured_webhook_key_rejects_everything() {
        let auth = AuthManager::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryRefreshTokenRepository::new()),
            AuthConfig::new(SECRET, ""),
        );
        assert!(auth.authorize_webhook(&authorization("ApiKey x")).is_err());
    }
}
