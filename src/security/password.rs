use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("credential hashing failed: {0}")]
pub struct CodecError(String);

/// Hash a secret (password or recovery answer) into a PHC string.
pub fn hash(plaintext: &str) -> Result<String, CodecError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| CodecError(e.to_string()))
}

/// Check `plaintext` against a stored digest. A digest that does not parse
/// never verifies.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
