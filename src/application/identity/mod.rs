//! Identity module — account lifecycle & authentication
//!
//! Contains the `AccountService` which orchestrates all account-related
//! use-cases: registration, activation, login, password reset.

pub mod service;

pub use service::{AccountService, AuthResult};
