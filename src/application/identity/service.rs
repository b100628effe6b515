//! Account lifecycle service — application-layer orchestration
//!
//! Registration, activation, password reset, login and admin checks.
//! Front ends (CLI, an embedding web framework) should be thin wrappers
//! that delegate to this service.

use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{BoxStream, StreamExt};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::config::AccountsConfig;
use crate::domain::{
    Account, AccountPrincipal, AccountRepositoryInterface, BearerTokenService, CreateAccountDto,
    DomainError, DomainResult, PasswordHasher, ACTIVATED_SENTINEL, ADMIN_ROLE,
};
use crate::infrastructure::crypto::ActivationTokenIssuer;

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub principal: AccountPrincipal,
}

/// Account service — orchestrates every account lifecycle use-case.
///
/// Generic over `R: AccountRepositoryInterface` so it stays decoupled from
/// the concrete persistence layer. Holds no state between calls.
pub struct AccountService<R: AccountRepositoryInterface> {
    repo: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn BearerTokenService>,
    activation: ActivationTokenIssuer,
    config: AccountsConfig,
}

impl<R: AccountRepositoryInterface> AccountService<R> {
    pub fn new(
        repo: Arc<R>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn BearerTokenService>,
        activation: ActivationTokenIssuer,
        config: AccountsConfig,
    ) -> Self {
        Self {
            repo,
            hasher,
            tokens,
            activation,
            config,
        }
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a new account in the pending-activation state.
    pub async fn register(&self, candidate: CreateAccountDto) -> DomainResult<Account> {
        candidate.validate()?;

        // Not atomic with the save below; the store's unique constraints
        // catch whatever slips through.
        if self.repo.find_by_username(&candidate.username).await?.is_some() {
            return Err(DomainError::DuplicateIdentity {
                field: "username",
                value: candidate.username,
            });
        }
        if self.repo.find_by_email(&candidate.email).await?.is_some() {
            return Err(DomainError::DuplicateIdentity {
                field: "email",
                value: candidate.email,
            });
        }

        let password_hash = self.hash_password(&candidate.password).await?;
        let now = Utc::now();
        let mut account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            username: candidate.username,
            email: candidate.email,
            password_hash,
            token: String::new(),
            role: self.config.default_role.clone(),
            created_at: now,
            updated_at: now,
        };
        self.issue_activation_token(&mut account, false).await?;

        self.repo.save(&account).await?;

        info!(account_id = %account.id, username = %account.username, "New account registered");
        Ok(account)
    }

    /// Derive the pending activation token for `account` and set it.
    /// With `persist`, the account is saved as well.
    pub async fn issue_activation_token(
        &self,
        account: &mut Account,
        persist: bool,
    ) -> DomainResult<String> {
        let token = self.activation.derive(&account.email, &account.username);
        account.token = token.clone();

        if persist {
            account.touch();
            self.repo.save(account).await?;
        }
        Ok(token)
    }

    // ── Authentication ──────────────────────────────────────────

    /// Identity lookup for the authentication pipeline. Does not check the
    /// password.
    pub async fn load_principal(&self, username_or_email: &str) -> DomainResult<AccountPrincipal> {
        let account = self
            .repo
            .find_by_username_or_email(username_or_email, username_or_email)
            .await?
            .ok_or_else(|| DomainError::account_not_found("username", username_or_email))?;

        if self.config.require_activation && !account.is_activated() {
            warn!(
                username = %username_or_email,
                "Login attempt on an account that is not activated yet"
            );
            return Err(DomainError::NotActivated(account.username));
        }

        Ok(account.principal())
    }

    /// Full login: identity lookup, password check, bearer token.
    pub async fn login(&self, username_or_email: &str, password: &str) -> DomainResult<AuthResult> {
        let principal = match self.load_principal(username_or_email).await {
            Ok(p) => p,
            Err(DomainError::NotFound { .. }) => {
                return Err(DomainError::Unauthorized("Invalid credentials".into()));
            }
            Err(e) => return Err(e),
        };

        let valid = match self
            .verify_password(password, &principal.password_hash)
            .await
        {
            Ok(valid) => valid,
            Err(e) => {
                warn!(username = %principal.username, error = %e, "Stored password hash is unreadable");
                false
            }
        };
        if !valid {
            warn!(username = %principal.username, "Rejected login: bad password");
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        let token = self.tokens.issue(&principal)?;

        info!(username = %principal.username, "Login succeeded");
        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.tokens.expires_in_secs(),
            principal,
        })
    }

    // ── Activation ──────────────────────────────────────────────

    /// Consume a pending activation token.
    pub async fn activate(&self, token: &str) -> DomainResult<Account> {
        let len = token.chars().count();
        if token == ACTIVATED_SENTINEL || len < self.config.min_token_length {
            debug!(len, "Activation token rejected before lookup");
            return Err(DomainError::InvalidToken(
                "token is already consumed or too short".into(),
            ));
        }

        let mut account = self
            .repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| DomainError::account_not_found("token", token))?;

        account.mark_activated();
        self.repo.save(&account).await?;

        info!(username = %account.username, "Account activated");
        Ok(account)
    }

    /// Put the account behind `email` back into pending activation.
    pub async fn reset_activation(&self, email: &str) -> DomainResult<Account> {
        let mut account = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::account_not_found("email", email))?;

        self.issue_activation_token(&mut account, true).await?;

        info!(username = %account.username, "Activation token reissued");
        Ok(account)
    }

    // ── Commands (mutations) ────────────────────────────────────

    /// Replace the password of `username`. Also marks the account activated.
    pub async fn reset_password(&self, username: &str, new_password: &str) -> DomainResult<()> {
        if new_password.is_empty() {
            return Err(DomainError::Validation("password is required".into()));
        }

        let mut account = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::account_not_found("username", username))?;

        account.password_hash = self.hash_password(new_password).await?;
        account.mark_activated();
        self.repo.save(&account).await?;

        info!(username, "Password reset");
        Ok(())
    }

    /// Persist an already-built account as-is.
    pub async fn save_account(&self, account: &Account) -> DomainResult<()> {
        self.repo.save(account).await
    }

    /// Delete by username. Deleting a missing account is not an error.
    pub async fn delete(&self, username: &str) -> DomainResult<()> {
        self.repo.delete_by_username(username).await?;
        info!(username, "Account deleted");
        Ok(())
    }

    /// Create an activated admin account if the store is empty.
    pub async fn ensure_default_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> DomainResult<bool> {
        if self.repo.count().await? > 0 {
            return Ok(false);
        }

        let password_hash = self.hash_password(password).await?;
        let now = Utc::now();
        let admin = Account {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            token: ACTIVATED_SENTINEL.to_string(),
            role: ADMIN_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.save_account(&admin).await?;

        info!(username, "Default admin created");
        warn!("Please change the default admin password immediately");
        Ok(true)
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Whether the bearer of `auth_token` holds the admin role.
    pub async fn is_admin(&self, auth_token: &str) -> DomainResult<bool> {
        let username = self.tokens.extract_identity(auth_token)?;

        let account = self
            .repo
            .find_by_username(&username)
            .await?
            .ok_or_else(|| DomainError::account_not_found("username", username))?;

        Ok(account.is_admin())
    }

    /// Lazily stream every stored username.
    pub async fn list_all_usernames(&self) -> DomainResult<BoxStream<'_, DomainResult<String>>> {
        let accounts = self.repo.find_all().await?;
        Ok(accounts
            .map(|row| row.map(|account| account.username))
            .boxed())
    }

    // ── Password hashing ────────────────────────────────────────

    // bcrypt is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, plaintext: &str) -> DomainResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| DomainError::Crypto(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, plaintext: &str, hash: &str) -> DomainResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash))
            .await
            .map_err(|e| DomainError::Crypto(format!("Password check task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use futures_util::TryStreamExt;

    use super::*;
    use crate::infrastructure::crypto::{BcryptPasswordHasher, JwtConfig, JwtTokenService};
    use crate::infrastructure::InMemoryAccountRepository;

    /// Wraps the in-memory store and counts every call and every write.
    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryAccountRepository,
        calls: AtomicUsize,
        writes: AtomicUsize,
    }

    impl CountingRepository {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn read(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn write(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AccountRepositoryInterface for CountingRepository {
        async fn find_by_username_or_email(
            &self,
            username: &str,
            email: &str,
        ) -> DomainResult<Option<Account>> {
            self.read();
            self.inner.find_by_username_or_email(username, email).await
        }

        async fn find_by_username(&self, username: &str) -> DomainResult<Option<Account>> {
            self.read();
            self.inner.find_by_username(username).await
        }

        async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
            self.read();
            self.inner.find_by_email(email).await
        }

        async fn find_by_token(&self, token: &str) -> DomainResult<Option<Account>> {
            self.read();
            self.inner.find_by_token(token).await
        }

        async fn save(&self, account: &Account) -> DomainResult<()> {
            self.write();
            self.inner.save(account).await
        }

        async fn delete_by_username(&self, username: &str) -> DomainResult<()> {
            self.write();
            self.inner.delete_by_username(username).await
        }

        async fn find_all(&self) -> DomainResult<BoxStream<'_, DomainResult<Account>>> {
            self.read();
            self.inner.find_all().await
        }

        async fn count(&self) -> DomainResult<u64> {
            self.read();
            self.inner.count().await
        }
    }

    fn jwt() -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
            issuer: "account-service".into(),
        })
    }

    fn service_with(
        config: AccountsConfig,
    ) -> (AccountService<CountingRepository>, Arc<CountingRepository>) {
        let repo = Arc::new(CountingRepository::default());
        let service = AccountService::new(
            repo.clone(),
            Arc::new(BcryptPasswordHasher::new(4)),
            Arc::new(jwt()),
            ActivationTokenIssuer::new("app-secret"),
            config,
        );
        (service, repo)
    }

    fn service() -> (AccountService<CountingRepository>, Arc<CountingRepository>) {
        service_with(AccountsConfig::default())
    }

    fn candidate(username: &str, email: &str, password: &str) -> CreateAccountDto {
        CreateAccountDto {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    async fn register_ana(service: &AccountService<CountingRepository>) -> Account {
        service
            .register(candidate("ana", "ana@x.com", "pw1"))
            .await
            .unwrap()
    }

    fn token_for(principal_name: &str) -> String {
        jwt()
            .issue(&AccountPrincipal {
                username: principal_name.into(),
                password_hash: String::new(),
                scopes: vec![],
            })
            .unwrap()
    }

    #[tokio::test]
    async fn register_stores_pending_user_account() {
        let (service, repo) = service();
        let account = register_ana(&service).await;

        assert_eq!(account.role, "User");
        assert!(account.token.len() >= 5);
        assert!(!account.is_activated());
        assert_ne!(account.password_hash, "pw1");
        assert!(BcryptPasswordHasher::new(4)
            .verify("pw1", &account.password_hash)
            .unwrap());

        let stored = repo.inner.find_by_username("ana").await.unwrap().unwrap();
        assert_eq!(stored.token, account.token);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let (service, _) = service();
        register_ana(&service).await;

        let err = service
            .register(candidate("ana", "other@x.com", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateIdentity { field: "username", .. }));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (service, _) = service();
        register_ana(&service).await;

        let err = service
            .register(candidate("bob", "ana@x.com", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateIdentity { field: "email", .. }));
    }

    #[tokio::test]
    async fn register_validates_candidate() {
        let (service, repo) = service();
        let err = service
            .register(candidate("ana", "not-an-email", "pw1"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn pending_account_cannot_log_in_when_activation_required() {
        let (service, _) = service();
        register_ana(&service).await;

        let err = service.load_principal("ana").await.unwrap_err();
        assert!(matches!(err, DomainError::NotActivated(_)));
    }

    #[tokio::test]
    async fn pending_account_can_log_in_when_activation_optional() {
        let (service, _) = service_with(AccountsConfig {
            require_activation: false,
            ..AccountsConfig::default()
        });
        register_ana(&service).await;

        let principal = service.load_principal("ana@x.com").await.unwrap();
        assert_eq!(principal.username, "ana");
        assert_eq!(principal.scopes, vec!["User".to_string()]);
    }

    #[tokio::test]
    async fn load_principal_unknown_is_not_found() {
        let (service, _) = service();
        let err = service.load_principal("ghost").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn activate_consumes_token_exactly_once() {
        let (service, _) = service();
        let account = register_ana(&service).await;

        let activated = service.activate(&account.token).await.unwrap();
        assert_eq!(activated.token, ACTIVATED_SENTINEL);
        assert!(service.load_principal("ana").await.is_ok());

        let err = service.activate(&account.token).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn activate_rejects_sentinel_and_short_tokens_without_store_access() {
        let (service, repo) = service();

        // "éééé" is four characters but eight bytes.
        for token in [ACTIVATED_SENTINEL, "", "abcd", "éééé"] {
            let err = service.activate(token).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidToken(_)));
        }
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn reset_password_unknown_user_writes_nothing() {
        let (service, repo) = service();

        let err = service.reset_password("ghost", "new-pw").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn reset_password_rehashes_and_activates() {
        let (service, repo) = service();
        let original = register_ana(&service).await;

        service.reset_password("ana", "new-pw").await.unwrap();

        let stored = repo.inner.find_by_username("ana").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, original.password_hash);
        assert_eq!(stored.token, ACTIVATED_SENTINEL);
        let hasher = BcryptPasswordHasher::new(4);
        assert!(hasher.verify("new-pw", &stored.password_hash).unwrap());
        assert!(!hasher.verify("pw1", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn reset_activation_reissues_pending_token() {
        let (service, repo) = service();
        let account = register_ana(&service).await;
        service.activate(&account.token).await.unwrap();

        let reset = service.reset_activation("ana@x.com").await.unwrap();
        assert_eq!(reset.token, account.token);

        let stored = repo.inner.find_by_username("ana").await.unwrap().unwrap();
        assert!(!stored.is_activated());
    }

    #[tokio::test]
    async fn reset_activation_unknown_email_is_not_found() {
        let (service, repo) = service();
        let err = service.reset_activation("ghost@x.com").await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { field: "email", .. }));
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn issue_activation_token_without_persist_skips_store() {
        let (service, repo) = service();
        let mut account = register_ana(&service).await;
        let writes = repo.writes();

        account.token = ACTIVATED_SENTINEL.into();
        let token = service
            .issue_activation_token(&mut account, false)
            .await
            .unwrap();

        assert_eq!(account.token, token);
        assert_eq!(repo.writes(), writes);
    }

    #[tokio::test]
    async fn is_admin_follows_role() {
        let (service, repo) = service();
        let mut account = register_ana(&service).await;
        register_ana_sibling(&service).await;

        account.role = "Admin".into();
        repo.inner.save(&account).await.unwrap();

        assert!(service.is_admin(&token_for("ana")).await.unwrap());
        assert!(!service.is_admin(&token_for("bob")).await.unwrap());
    }

    async fn register_ana_sibling(service: &AccountService<CountingRepository>) {
        service
            .register(candidate("bob", "bob@x.com", "pw2"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn is_admin_unknown_user_is_not_found() {
        let (service, _) = service();
        let err = service.is_admin(&token_for("ghost")).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn is_admin_garbage_token_is_unauthorized() {
        let (service, repo) = service();
        let err = service.is_admin("garbage").await.unwrap_err();

        assert!(matches!(err, DomainError::Unauthorized(_)));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn login_checks_password_and_issues_token() {
        let (service, _) = service();
        let account = register_ana(&service).await;
        service.activate(&account.token).await.unwrap();

        let auth = service.login("ana@x.com", "pw1").await.unwrap();
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 3600);
        assert_eq!(jwt().extract_identity(&auth.token).unwrap(), "ana");

        let err = service.login("ana", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        let err = service.login("ghost", "pw1").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn login_with_corrupt_stored_hash_is_rejected() {
        let (service, repo) = service();
        let mut account = register_ana(&service).await;
        account.mark_activated();
        account.password_hash = "not-a-bcrypt-hash".into();
        repo.inner.save(&account).await.unwrap();

        let err = service.login("ana", "pw1").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    /// bcrypt at cost 4 plus a fixed delay, so hashing takes a noticeable while.
    struct SlowHasher {
        inner: BcryptPasswordHasher,
        delay: Duration,
    }

    impl PasswordHasher for SlowHasher {
        fn hash(&self, plaintext: &str) -> DomainResult<String> {
            std::thread::sleep(self.delay);
            self.inner.hash(plaintext)
        }

        fn verify(&self, plaintext: &str, hash: &str) -> DomainResult<bool> {
            std::thread::sleep(self.delay);
            self.inner.verify(plaintext, hash)
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn register_does_not_stall_other_tasks_while_hashing() {
        let service = AccountService::new(
            Arc::new(CountingRepository::default()),
            Arc::new(SlowHasher {
                inner: BcryptPasswordHasher::new(4),
                delay: Duration::from_millis(200),
            }),
            Arc::new(jwt()),
            ActivationTokenIssuer::new("app-secret"),
            AccountsConfig::default(),
        );

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = Arc::clone(&ticks);
            async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        });

        service
            .register(candidate("ana", "ana@x.com", "pw1"))
            .await
            .unwrap();
        ticker.abort();

        assert!(ticks.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (service, repo) = service();
        register_ana(&service).await;

        service.delete("ana").await.unwrap();
        service.delete("ana").await.unwrap();
        assert!(repo.inner.find_by_username("ana").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_all_usernames_yields_each_account() {
        let (service, _) = service();
        register_ana(&service).await;
        register_ana_sibling(&service).await;

        let mut names: Vec<String> = service
            .list_all_usernames()
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        names.sort();
        assert_eq!(names, vec!["ana".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn default_admin_is_created_only_on_empty_store() {
        let (service, _) = service();

        assert!(service
            .ensure_default_admin("admin", "admin@localhost", "admin")
            .await
            .unwrap());
        assert!(!service
            .ensure_default_admin("admin2", "admin2@localhost", "admin")
            .await
            .unwrap());

        let principal = service.load_principal("admin").await.unwrap();
        assert!(principal.scopes.contains(&ADMIN_ROLE.to_string()));
    }
}
