//! Credential ports — hashing and bearer tokens
//!
//! The account service never touches a hashing or signing library directly.
//! Adapters in `infrastructure::crypto` implement these contracts.

use crate::domain::{AccountPrincipal, DomainResult};

// ── PasswordHasher ─────────────────────────────────────────────

/// One-way, salted password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> DomainResult<String>;

    /// A malformed stored hash is an error, a mismatch is `Ok(false)`.
    fn verify(&self, plaintext: &str, hash: &str) -> DomainResult<bool>;
}

// ── BearerTokenService ─────────────────────────────────────────

/// Issues and reads the bearer tokens presented by logged-in clients.
pub trait BearerTokenService: Send + Sync {
    fn issue(&self, principal: &AccountPrincipal) -> DomainResult<String>;

    /// Returns the username carried by a valid token.
    fn extract_identity(&self, token: &str) -> DomainResult<String>;

    /// Lifetime of issued tokens, in seconds.
    fn expires_in_secs(&self) -> i64;
}
