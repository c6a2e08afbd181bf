//! Authentication error types.

use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header on the request
    #[error("Missing credential")]
    MissingCredential,

    /// `Authorization` header present but not in the expected scheme
    #[error("Malformed credential")]
    MalformedCredential,

    /// Access token could not be parsed
    #[error("Malformed token")]
    MalformedToken,

    /// Access token MAC does not verify against the configured secret
    #[error("Bad token signature")]
    BadSignature,

    /// Access token was issued by someone else
    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Access token subject is not a user identifier
    #[error("Invalid token subject")]
    InvalidSubject,

    /// Token lifetime has elapsed
    #[error("Token expired")]
    Expired,

    /// Refresh token has been revoked
    #[error("Token revoked")]
    Revoked,

    /// Refresh token does not exist
    #[error("Token not found")]
    NotFound,

    /// Collapsed credential failure, safe to show to callers
    #[error("Unauthorized")]
    Unauthorized,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Password did not match the stored hash
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already registered
    #[error("Email already exists")]
    EmailTaken,

    /// Email rejected at registration
    #[error("Invalid email: {0}")]
    InvalidEmail(&'static str),

    /// Password rejected at registration
    #[error("Password too weak: {0}")]
    WeakPassword(&'static str),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Stored hash is not a PHC string
    #[error("Password hash is malformed")]
    VerificationFailed,

    /// Randomness or signing failure while minting a token
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    /// Database error
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Database call exceeded its deadline
    #[error("Database operation timed out after {0:?}")]
    StorageTimeout(Duration),
}

impl From<TimeoutError> for AuthError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => AuthError::StorageTimeout(duration),
            TimeoutError::Database(e) => AuthError::Storage(e),
        }
    }
}

impl AuthError {
    /// HTTP status for this error at the request boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedCredential
            | AuthError::MalformedToken
            | AuthError::BadSignature
            | AuthError::InvalidIssuer
            | AuthError::InvalidSubject
            | AuthError::Expired
            | AuthError::Revoked
            | AuthError::Unauthorized
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,

            AuthError::NotFound | AuthError::UserNotFound => StatusCode::NOT_FOUND,

            AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,

            AuthError::EmailTaken => StatusCode::CONFLICT,

            AuthError::HashingFailed
            | AuthError::VerificationFailed
            | AuthError::TokenGeneration(_)
            | AuthError::Storage(_)
            | AuthError::StorageTimeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable snake_case identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::MalformedToken => "malformed_token",
            AuthError::BadSignature => "bad_signature",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidSubject => "invalid_subject",
            AuthError::Expired => "expired",
            AuthError::Revoked => "revoked",
            AuthError::NotFound => "not_found",
            AuthError::Unauthorized | AuthError::InvalidCredentials => "unauthorized",
            AuthError::UserNotFound => "user_not_found",
            AuthError::EmailTaken => "email_taken",
            AuthError::InvalidEmail(_) => "invalid_email",
            AuthError::WeakPassword(_) => "weak_password",
            AuthError::HashingFailed
            | AuthError::VerificationFailed
            | AuthError::TokenGeneration(_)
            | AuthError::Storage(_)
            | AuthError::StorageTimeout(_) => "internal",
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Every credential failure reads the same, and internal faults never
    /// carry their source text.
    pub fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::UNAUTHORIZED => "Invalid or missing credentials".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether this is a server-side fault rather than a caller error.
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
