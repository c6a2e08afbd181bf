//! HS256 access tokens.
//!
//! Access tokens are stateless: nothing is stored server-side, so a token
//! stays valid until `exp` no matter what happens to the session that minted
//! it. Keep the lifetime ceiling short.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use uuid::Uuid;

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, UserId},
};

/// Issuer written into and required from every access token
pub const ISSUER: &str = "chirpy";

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::hours(1);

/// Lifetime bounds for newly issued access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessTokenPolicy {
    /// Used when the caller asks for nothing, or for something out of range
    pub default_ttl: Duration,
    /// Largest lifetime a caller may request
    pub max_ttl: Duration,
}

impl Default for AccessTokenPolicy {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            max_ttl: DEFAULT_ACCESS_TOKEN_TTL,
        }
    }
}

impl AccessTokenPolicy {
    /// Clamp a requested lifetime.
    ///
    /// Zero, negative and above-ceiling requests all fall back to the default
    /// rather than being truncated to the ceiling.
    pub fn effective_ttl(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(ttl) if ttl > Duration::zero() && ttl <= self.max_ttl => ttl,
            _ => self.default_ttl,
        }
    }
}

/// Sign a new access token for `user_id`.
pub fn issue_access_token(user_id: UserId, secret: &[u8], ttl: Duration) -> AuthResult<String> {
    let now = Utc::now();
    let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
        AuthError::TokenGeneration(format!("access token lifetime {ttl} out of range"))
    })?;
    let claims = AccessTokenClaims {
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Validate an access token against the current time.
pub fn validate_access_token(token: &str, secret: &[u8]) -> AuthResult<UserId> {
    validate_access_token_at(token, secret, Utc::now())
}

/// Validate an access token as of `now`.
///
/// # Errors
///
/// * `AuthError::MalformedToken` - not a parseable HS256 token with our claims
/// * `AuthError::BadSignature` - MAC does not verify against `secret`
/// * `AuthError::InvalidIssuer` - `iss` is not [`ISSUER`]
/// * `AuthError::Expired` - `now >= exp`
/// * `AuthError::InvalidSubject` - `sub` is not a user ID
pub fn validate_access_token_at(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> AuthResult<UserId> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked below against the caller's clock, with no leeway.
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.set_issuer(&[ISSUER]);

    let token_data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        _ => AuthError::MalformedToken,
    })?;

    let claims = token_data.claims;
    if now.timestamp() >= claims.exp {
        return Err(AuthError::Expired);
    }

    Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidSubject)
}

/// Secret and lifetime policy bundled for the session layer
#[derive(Clone)]
pub struct AccessTokenCodec {
    secret: Vec<u8>,
    policy: AccessTokenPolicy,
}

impl std::fmt::Debug for AccessTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenCodec")
            .field("secret", &"<redacted>")
            .field("policy", &self.policy)
            .finish()
    }
}

impl AccessTokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>, policy: AccessTokenPolicy) -> Self {
        Self {
            secret: secret.into(),
            policy,
        }
    }

    pub fn policy(&self) -> &AccessTokenPolicy {
        &self.policy
    }

    /// Issue a token with the requested lifetime, clamped by the policy.
    pub fn issue(&self, user_id: UserId, requested: Option<Duration>) -> AuthResult<String> {
        issue_access_token(user_id, &self.secret, self.policy.effective_ttl(requested))
    }

    pub fn validate(&self, token: &str) -> AuthResult<UserId> {
        validate_access_token(token, &self.secret)
    }
}
