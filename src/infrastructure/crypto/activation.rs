//! Activation token derivation

use sha2::{Digest, Sha256};

/// Length of every derived token (hex-encoded SHA-256).
pub const ACTIVATION_TOKEN_LEN: usize = 64;

/// Derives email-activation tokens from account identity and a shared secret.
///
/// The output is deterministic: the same email, username and secret always
/// give the same token. Only the secret keeps it unguessable.
#[derive(Clone)]
pub struct ActivationTokenIssuer {
    secret: String,
}

impl ActivationTokenIssuer {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn derive(&self, email: &str, username: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(email.as_bytes());
        hasher.update(username.as_bytes());
        hasher.update(self.secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Debug for ActivationTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationTokenIssuer").finish_non_exhaustive()
    }
}
