//! Argon2id password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::errors::{AuthError, AuthResult};

/// Well-formed Argon2id hash that no password matches.
///
/// Verified against when a login names an unknown email, so that branch
/// costs the same as a wrong password. Parameters match `Argon2::default()`.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$fzsvtmP87LPSExtUEwpeeA$2F+/bbg4qb/Z9C6yLIk0D9mLYq+7aQFx6cbJPoHf8QE";

/// Hash a password with Argon2id and a fresh random salt.
///
/// The returned PHC string embeds the salt and parameters, so hashing the
/// same password twice gives two different strings that both verify.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::HashingFailed)?
        .to_string())
}

/// Verify a password against a stored hash.
///
/// Returns `Ok(false)` on mismatch. The digest comparison inside argon2 is
/// constant-time over the full output.
///
/// # Errors
///
/// * `AuthError::VerificationFailed` - `hash` is not a PHC string
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::VerificationFailed)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(AuthError::VerificationFailed),
    }
}
