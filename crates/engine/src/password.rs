use argon2::{
    Argon2,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use chrono::TimeDelta;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{EngineError, ResultEngine};

pub const MIN_PASSWORD_LEN: usize = 8;

/// How long an emailed reset token stays valid.
pub const RESET_TOKEN_TTL: TimeDelta = TimeDelta::minutes(15);

pub(crate) fn validate_password(password: &str) -> ResultEngine<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Hash `password` into an argon2 PHC string with a fresh salt.
pub(crate) fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::PasswordHash(err.to_string()))
}

pub(crate) fn verify_password(password: &str, stored_hash: &str) -> ResultEngine<()> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| EngineError::PasswordHash(err.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|err| match err {
            PasswordHashError::Password => EngineError::InvalidCredentials,
            other => EngineError::PasswordHash(other.to_string()),
        })
}

/// Fresh reset token and the hash that gets stored. Only the hash is persisted.
pub(crate) fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let hash = hash_reset_token(&token);
    (token, hash)
}

pub(crate) fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}
