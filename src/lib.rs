//! # Account Service
//!
//! User accounts for a web application: registration, email activation,
//! login, password reset and admin checks over an async account store.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Account entity, errors, repository and credential ports
//! - **application**: `AccountService`, the account lifecycle use cases
//! - **infrastructure**: SeaORM and in-memory stores, bcrypt, JWT,
//!   activation-token derivation
//! - **config**: TOML configuration
//! - **support**: errors and logging setup

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod support;

pub use config::{default_config_path, AccountsConfig, AppConfig};

pub use application::{AccountService, AuthResult};
pub use domain::{Account, AccountPrincipal, CreateAccountDto, DomainError, DomainResult};

// Re-export database types for easy access
pub use infrastructure::{init_database, run_migrations, AccountRepository, DatabaseConfig};

pub use support::logging::init_tracing;
