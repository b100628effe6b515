//! Password hashing utilities

use bcrypt::{hash, verify};

use crate::domain::{DomainError, DomainResult, PasswordHasher};

/// Hash a password using bcrypt
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// bcrypt-backed [`PasswordHasher`].
#[derive(Debug, Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, plaintext: &str) -> DomainResult<String> {
        hash_password(plaintext, self.cost)
            .map_err(|e| DomainError::Crypto(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> DomainResult<bool> {
        verify_password(plaintext, hash)
            .map_err(|e| DomainError::Crypto(format!("Failed to verify password: {}", e)))
    }
}
