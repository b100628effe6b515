//! Credential adapters: bcrypt hashing, JWT bearer tokens, activation tokens

pub mod activation;
pub mod jwt;
pub mod password;

pub use activation::{ActivationTokenIssuer, ACTIVATION_TOKEN_LEN};
pub use jwt::{JwtConfig, JwtTokenService};
pub use password::BcryptPasswordHasher;
