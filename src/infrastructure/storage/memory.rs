//! In-memory account storage

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::domain::{Account, AccountRepositoryInterface, DomainError, DomainResult};

/// In-memory account store for development and testing.
///
/// Rows are keyed by account id. Username and email uniqueness is checked
/// on save the same way the database's unique indexes would.
pub struct InMemoryAccountRepository {
    accounts: DashMap<String, Account>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    fn find_first(&self, pred: impl Fn(&Account) -> bool) -> Option<Account> {
        self.accounts
            .iter()
            .find(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
    }
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepositoryInterface for InMemoryAccountRepository {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> DomainResult<Option<Account>> {
        Ok(self.find_first(|a| a.username == username || a.email == email))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<Account>> {
        Ok(self.find_first(|a| a.username == username))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        Ok(self.find_first(|a| a.email == email))
    }

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<Account>> {
        Ok(self.find_first(|a| a.token == token))
    }

    async fn save(&self, account: &Account) -> DomainResult<()> {
        let clash = self.find_first(|a| {
            a.id != account.id && (a.username == account.username || a.email == account.email)
        });
        if let Some(other) = clash {
            let (field, value) = if other.username == account.username {
                ("username", account.username.clone())
            } else {
                ("email", account.email.clone())
            };
            return Err(DomainError::DuplicateIdentity { field, value });
        }

        self.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn delete_by_username(&self, username: &str) -> DomainResult<()> {
        self.accounts.retain(|_, a| a.username != username);
        Ok(())
    }

    async fn find_all(&self) -> DomainResult<BoxStream<'_, DomainResult<Account>>> {
        let snapshot: Vec<Account> = self.accounts.iter().map(|e| e.value().clone()).collect();
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.accounts.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn account(id: &str, username: &str, email: &str) -> Account {
        let now = Utc::now();
        Account {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
            token: "pending-token".into(),
            role: "User".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_rejects_identity_owned_by_another_id() {
        let repo = InMemoryAccountRepository::new();
        repo.save(&account("1", "ana", "ana@x.com")).await.unwrap();

        let err = repo.save(&account("2", "ana", "new@x.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateIdentity { field: "username", .. }));

        let err = repo.save(&account("3", "bob", "ana@x.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateIdentity { field: "email", .. }));
    }

    #[tokio::test]
    async fn resaving_same_id_updates_in_place() {
        let repo = InMemoryAccountRepository::new();
        let mut acc = account("1", "ana", "ana@x.com");
        repo.save(&acc).await.unwrap();

        acc.role = "Admin".into();
        repo.save(&acc).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.find_by_username("ana").await.unwrap().unwrap();
        assert_eq!(stored.role, "Admin");
    }

    #[tokio::test]
    async fn delete_missing_username_is_ok() {
        let repo = InMemoryAccountRepository::new();
        repo.delete_by_username("ghost").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
