use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;

use crate::error::AppError;

pub const SALT_LEN: usize = 16;
pub const HASH_LEN: usize = 32;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Generate a random per-identity salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    rand::thread_rng().gen()
}

fn hasher() -> Result<Argon2<'static>, AppError> {
    let params = Params::new(
        Params::DEFAULT_M_COST,
        Params::DEFAULT_T_COST,
        Params::DEFAULT_P_COST,
        Some(HASH_LEN),
    )
    .map_err(|e| AppError::Crypto(format!("Invalid Argon2 parameters: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with Argon2id using the provided salt
pub fn hash_password(password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN], AppError> {
    let mut hash = [0u8; HASH_LEN];
    hasher()?
        .hash_password_into(password.as_bytes(), salt, &mut hash)
        .map_err(|e| AppError::Crypto(format!("Password hashing failed: {}", e)))?;
    Ok(hash)
}

/// Recompute the hash and compare without short-circuiting on the first differing byte
pub fn verify_password(password: &str, stored_hash: &[u8], salt: &[u8]) -> Result<bool, AppError> {
    if stored_hash.len() != HASH_LEN {
        return Err(AppError::Crypto("Stored hash has unexpected length".to_string()));
    }
    let computed = hash_password(password, salt)?;
    let diff = computed
        .iter()
        .zip(stored_hash)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b));
    Ok(diff == 0)
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
