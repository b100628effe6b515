use std::fmt;

use chrono::{DateTime, Utc};

/// Token value that marks an account as activated.
pub const ACTIVATED_SENTINEL: &str = "1";

/// Role label that grants administrator privilege.
pub const ADMIN_ROLE: &str = "Admin";

/// Where an account stands in its activation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    PendingActivation,
    Activated,
}

/// Account model
#[derive(Clone)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Either [`ACTIVATED_SENTINEL`] or a pending activation code.
    pub token: String,
    /// Comma-separated authority labels, e.g. `"User"` or `"User,Admin"`.
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn activation_state(&self) -> ActivationState {
        if self.token == ACTIVATED_SENTINEL {
            ActivationState::Activated
        } else {
            ActivationState::PendingActivation
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activation_state() == ActivationState::Activated
    }

    /// Authorization scopes derived from the role label.
    pub fn scopes(&self) -> Vec<String> {
        role_scopes(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.scopes().iter().any(|scope| scope == ADMIN_ROLE)
    }

    pub fn mark_activated(&mut self) {
        self.token = ACTIVATED_SENTINEL.to_string();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn principal(&self) -> AccountPrincipal {
        AccountPrincipal {
            username: self.username.clone(),
            password_hash: self.password_hash.clone(),
            scopes: self.scopes(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("activation", &self.activation_state())
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Identity handed to the authentication pipeline.
#[derive(Clone)]
pub struct AccountPrincipal {
    pub username: String,
    pub password_hash: String,
    pub scopes: Vec<String>,
}

impl fmt::Debug for AccountPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountPrincipal")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("scopes", &self.scopes)
            .finish()
    }
}

pub fn role_scopes(role: &str) -> Vec<String> {
    role.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
