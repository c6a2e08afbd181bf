//! Integration tests for the session lifecycle.
//!
//! Runs the full register, login, refresh and revoke flow against the
//! in-memory stores so no PostgreSQL instance is needed.

use chirpy::auth::{
    AuthConfig, AuthError, AuthManager, LoginRequest, RefreshTokens, RegisterRequest,
};
use chirpy::db::{
    InMemoryRefreshTokenRepository, InMemoryUserRepository, RefreshTokenRepository,
    UserRepository,
};
use chrono::{Duration, Utc};
use http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
use std::sync::Arc;

const JWT_SECRET: &str = "integration_secret_key_0123456789abcdef";
const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";
const PASSWORD: &str = "0423404234";

/// Helper to create a manager over fresh in-memory stores
fn setup_auth_manager() -> (AuthManager, Arc<InMemoryUserRepository>) {
    let users = Arc::new(InMemoryUserRepository::new());
    let auth = AuthManager::new(
        users.clone(),
        Arc::new(InMemoryRefreshTokenRepository::new()),
        AuthConfig::new(JWT_SECRET, POLKA_KEY),
    );
    (auth, users)
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

async fn register(auth: &AuthManager, email: &str) {
    auth.register(RegisterRequest {
        email: email.to_string(),
        password: PASSWORD.to_string(),
    })
    .await
    .expect("Registration should succeed");
}

fn login_request(email: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        expires_in_seconds: None,
    }
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let (auth, _) = setup_auth_manager();
    register(&auth, "walt@breakingbad.com").await;

    let session = auth
        .login(login_request("walt@breakingbad.com"))
        .await
        .expect("Login should succeed");
    assert_eq!(session.refresh_token.len(), 64);

    // The access token identifies the user on protected endpoints.
    let user_id = auth.authenticate(&bearer(&session.access_token)).unwrap();
    assert_eq!(user_id, session.user.id);

    // Refresh mints a new, distinct access token for the same user.
    let refreshed = auth.refresh(&bearer(&session.refresh_token)).await.unwrap();
    assert_ne!(refreshed, session.access_token);
    assert_eq!(auth.authenticate(&bearer(&refreshed)).unwrap(), user_id);

    // After revocation the refresh token stops working.
    auth.revoke(&bearer(&session.refresh_token)).await.unwrap();
    let err = auth.refresh(&bearer(&session.refresh_token)).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));

    // Revoking again is harmless.
    assert!(auth.revoke(&bearer(&session.refresh_token)).await.is_ok());

    // Already-issued access tokens stay valid until they expire.
    assert_eq!(auth.authenticate(&bearer(&refreshed)).unwrap(), user_id);
}

#[tokio::test]
async fn test_revoking_one_session_keeps_the_other() {
    let (auth, _) = setup_auth_manager();
    register(&auth, "jesse@breakingbad.com").await;

    let laptop = auth.login(login_request("jesse@breakingbad.com")).await.unwrap();
    let phone = auth.login(login_request("jesse@breakingbad.com")).await.unwrap();

    auth.revoke(&bearer(&laptop.refresh_token)).await.unwrap();

    assert!(auth.refresh(&bearer(&laptop.refresh_token)).await.is_err());
    assert!(auth.refresh(&bearer(&phone.refresh_token)).await.is_ok());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let (auth, _) = setup_auth_manager();
    register(&auth, "saul@bcs.com").await;

    let result = auth
        .register(RegisterRequest {
            email: "saul@bcs.com".to_string(),
            password: "another-password".to_string(),
        })
        .await;

    assert!(
        matches!(result.unwrap_err(), AuthError::EmailTaken),
        "Should return EmailTaken error"
    );
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let (auth, _) = setup_auth_manager();
    register(&auth, "gus@pollos.com").await;
    let session = auth.login(login_request("gus@pollos.com")).await.unwrap();

    let err = auth.refresh(&bearer(&session.access_token)).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));

    let err = auth.authenticate(&bearer(&session.refresh_token)).unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn test_find_user_reflects_upgrade() {
    let (auth, users) = setup_auth_manager();
    register(&auth, "mike@pollos.com").await;
    let session = auth.login(login_request("mike@pollos.com")).await.unwrap();
    assert!(!session.user.is_chirpy_red);

    assert!(users.upgrade_to_red(session.user.id).await.unwrap());
    let user = auth.find_user(session.user.id).await.unwrap();
    assert!(user.is_chirpy_red);
    assert_eq!(user.email, "mike@pollos.com");
}

#[tokio::test]
async fn test_expired_refresh_token_is_revoked_on_use() {
    let repo = Arc::new(InMemoryRefreshTokenRepository::new());
    let tokens = RefreshTokens::new(repo.clone());
    let user_id = uuid::Uuid::new_v4();

    let record = tokens.create(user_id, Duration::days(60)).await.unwrap();
    let later = record.expires_at + Duration::seconds(1);

    let err = tokens.lookup_owner_at(&record.token, later).await.unwrap_err();
    assert!(matches!(err, AuthError::Expired));

    let stored = repo.find_by_token(&record.token).await.unwrap().unwrap();
    assert!(stored.revoked_at.is_some());

    // From now on the token reports as revoked.
    let err = tokens.lookup_owner_at(&record.token, Utc::now()).await.unwrap_err();
    assert!(matches!(err, AuthError::Revoked));
}
