//! Password hashing and verification.
//!
//! Stored values are Argon2id PHC strings. A stored value without the PHC
//! `$` delimiter is a plaintext development credential and only ever
//! matches in development mode.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::{RunMode, SecurityConfig};

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks `supplied` against a stored value. Never errors: anything that
/// cannot be verified is a mismatch.
#[must_use]
pub fn verify_password(stored: &str, supplied: &str, mode: RunMode) -> bool {
    if !stored.contains('$') {
        return mode.is_development() && stored == supplied;
    }

    // The params and salt embedded in the PHC string drive the verifier,
    // so hashes made under older cost settings keep working.
    let Ok(parsed) = PasswordHash::new(stored) else {
        tracing::warn!("Stored password hash is malformed");
        return false;
    };

    Argon2::default()
        .verify_password(supplied.as_bytes(), &parsed)
        .is_ok()
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();

    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(stored: String, supplied: &str, mode: RunMode) -> Result<bool> {
    let supplied = supplied.to_string();

    task::spawn_blocking(move || verify_password(&stored, &supplied, mode))
        .await
        .context("Password verification task panicked")
}
