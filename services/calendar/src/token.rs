//! Opaque session and refresh tokens

use rand::{RngCore, rngs::OsRng};
use tracing::error;

use crate::error::{ApiError, ApiResult};

/// Number of random bytes in a token; hex-encoded it is twice as long
pub const TOKEN_BYTES: usize = 32;

/// Source of opaque tokens
pub trait TokenGenerator: Send + Sync {
    /// Produce a fresh token
    fn generate(&self) -> ApiResult<String>;
}

/// Tokens read from the operating system's CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> ApiResult<String> {
        new_token()
    }
}

/// 32 random bytes as 64 lowercase hex characters
pub fn new_token() -> ApiResult<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        error!("Failed to read random bytes: {}", e);
        ApiError::TokenGeneration
    })?;

    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_is_64_lowercase_hex() {
        let token = new_token().unwrap();
        assert_eq!(token.len(), 2 * TOKEN_BYTES);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_tokens_differ() {
        let generator = RandomTokenGenerator;
        let tokens: HashSet<String> = (0..64).map(|_| generator.generate().unwrap()).collect();
        assert_eq!(tokens.len(), 64);
    }
}
