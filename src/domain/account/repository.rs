use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::Account;
use crate::domain::DomainResult;

/// Persistent account store.
///
/// Lookups return `Ok(None)` when nothing matches; turning that into a
/// `NotFound` is the caller's decision.
#[async_trait]
pub trait AccountRepositoryInterface: Send + Sync {
    /// Matches `username` against the username column and `email` against
    /// the email column, returning the first hit.
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> DomainResult<Option<Account>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>>;
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<Account>>;

    /// Insert or update by `id`.
    async fn save(&self, account: &Account) -> DomainResult<()>;

    /// Removes the account if present. Missing usernames are not an error.
    async fn delete_by_username(&self, username: &str) -> DomainResult<()>;

    /// Streams every account in the store's natural order.
    async fn find_all(&self) -> DomainResult<BoxStream<'_, DomainResult<Account>>>;

    async fn count(&self) -> DomainResult<u64>;
}
