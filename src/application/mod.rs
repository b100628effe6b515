//! Application layer - use cases over the domain

pub mod identity;

pub use identity::{AccountService, AuthResult};
