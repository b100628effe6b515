pub mod account;
pub mod ports;

// Re-export commonly used types
pub use account::{
    Account, AccountPrincipal, AccountRepositoryInterface, ActivationState, CreateAccountDto,
    ACTIVATED_SENTINEL, ADMIN_ROLE,
};
pub use ports::{BearerTokenService, PasswordHasher};

// Re-export DomainError from support for convenience
pub use crate::support::errors::{DomainError, DomainResult};
