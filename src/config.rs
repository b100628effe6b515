//! Configuration module
//!
//! The service reads a single TOML file. Every section is optional and
//! falls back to its defaults, so an empty file is a valid configuration.
//!
//! ```toml
//! [database]
//! url = "sqlite://./accounts.db?mode=rwc"
//!
//! [logging]
//! level = "info"
//! format = "text"
//!
//! [security]
//! activation_secret = "change-me"
//! jwt_secret = "change-me-too"
//!
//! [accounts]
//! require_activation = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::support::errors::InfraError;

/// Application name used for the default config directory.
const APP_DIR: &str = "account-service";

/// Default location: `~/.config/account-service/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSection,
    pub logging: LoggingSection,
    pub security: SecuritySection,
    pub accounts: AccountsConfig,
    pub admin: AdminSection,
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, InfraError> {
        Ok(toml::from_str(raw)?)
    }

    /// Secrets may be injected through the environment instead of the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("ACTIVATION_SECRET") {
            self.security.activation_secret = secret;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.security.jwt_secret.clone(),
            expiration_hours: self.security.jwt_expiration_hours,
            issuer: self.security.jwt_issuer.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./accounts.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    /// Shared secret mixed into activation tokens.
    pub activation_secret: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            activation_secret: "activation-secret-change-in-production".to_string(),
            jwt_secret: "super-secret-key-change-in-production".to_string(),
            jwt_issuer: "account-service".to_string(),
            jwt_expiration_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Account lifecycle policy, handed to `AccountService`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Block login until the activation token has been consumed.
    pub require_activation: bool,
    /// Role assigned at registration.
    pub default_role: String,
    /// Tokens shorter than this are never looked up.
    pub min_token_length: usize,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            require_activation: true,
            default_role: "User".to_string(),
            min_token_length: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSection {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@localhost".to_string(),
            password: "admin".to_string(),
        }
    }
}
