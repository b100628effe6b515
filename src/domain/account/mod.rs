//! Account aggregate
//!
//! Contains the Account entity, the registration DTO, and the repository
//! interface.

pub mod model;
pub mod repository;

mod dto_create;

pub use model::{
    role_scopes, Account, AccountPrincipal, ActivationState, ACTIVATED_SENTINEL, ADMIN_ROLE,
};

pub use dto_create::CreateAccountDto;

pub use repository::AccountRepositoryInterface;
