//! Credential extraction from request headers.

use http::{HeaderMap, header::AUTHORIZATION};

use super::errors::{AuthError, AuthResult};

/// Scheme for user session tokens
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme for trusted webhook callers
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<String> {
    scheme_credential(headers, BEARER_SCHEME)
}

/// Extract the key from `Authorization: ApiKey <key>`.
pub fn api_key(headers: &HeaderMap) -> AuthResult<String> {
    scheme_credential(headers, API_KEY_SCHEME)
}

/// Split `Authorization` into scheme and credential.
///
/// The scheme must be the whole first word, so `Bearerabc` is not a bearer
/// credential and a token that happens to contain the word is left intact.
fn scheme_credential(headers: &HeaderMap, scheme: &str) -> AuthResult<String> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?
        .trim();

    let (presented, credential) = value
        .split_once(char::is_whitespace)
        .ok_or(AuthError::MalformedCredential)?;

    if !presented.eq_ignore_ascii_case(scheme) {
        return Err(AuthError::MalformedCredential);
    }

    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AuthError::MalformedCredential);
    }

    Ok(credential.to_string())
}
