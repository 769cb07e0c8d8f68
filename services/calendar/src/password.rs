//! Adaptive password hashing
//!
//! Hashing and verification are CPU bound and run on the blocking pool.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::error::{ApiError, ApiResult};

/// Argon2id hasher with a tunable cost
#[derive(Debug, Clone)]
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a hasher using `memory_kib` of memory and `iterations` passes
    pub fn new(memory_kib: u32, iterations: u32) -> ApiResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| {
            error!("Invalid password hashing parameters: {}", e);
            ApiError::Internal
        })?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plain password into a PHC string
    pub async fn hash(&self, plain: &str) -> ApiResult<String> {
        let argon2 = self.argon2();
        let plain = plain.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(plain.as_bytes(), &salt)
                .map(|hash| hash.to_string())
        })
        .await
        .map_err(|e| {
            error!("Password hashing task failed: {}", e);
            ApiError::PasswordHashing
        })?
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::PasswordHashing
        })
    }

    /// Check `plain` against a stored digest
    ///
    /// A digest that cannot be parsed never matches.
    pub async fn verify(&self, digest: &str, plain: &str) -> bool {
        let argon2 = self.argon2();
        let digest = digest.to_owned();
        let plain = plain.to_owned();

        let result = tokio::task::spawn_blocking(move || match PasswordHash::new(&digest) {
            Ok(parsed) => argon2.verify_password(plain.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                warn!("Stored password hash is malformed: {}", e);
                false
            }
        })
        .await;

        result.unwrap_or_else(|e| {
            error!("Password verification task failed: {}", e);
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordManager {
        PasswordManager::new(1024, 1).unwrap()
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let passwords = cheap();
        let digest = passwords.hash("secret1").await.unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(passwords.verify(&digest, "secret1").await);
        assert!(!passwords.verify(&digest, "secret2").await);
    }

    #[tokio::test]
    async fn test_same_password_gets_distinct_salts() {
        let passwords = cheap();
        let a = passwords.hash("secret1").await.unwrap();
        let b = passwords.hash("secret1").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_digest_never_matches() {
        assert!(!cheap().verify("not-a-hash", "secret1").await);
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        assert_eq!(PasswordManager::new(0, 0).unwrap_err(), ApiError::Internal);
    }
}
