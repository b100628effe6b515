use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::domain::{Account, AccountRepositoryInterface, DomainError, DomainResult};
use crate::infrastructure::database::entities::user;

pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model) -> Account {
    Account {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        token: model.token,
        role: model.role,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn domain_to_active_model(account: &Account) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(account.id.clone()),
        username: Set(account.username.clone()),
        email: Set(account.email.clone()),
        password_hash: Set(account.password_hash.clone()),
        token: Set(account.token.clone()),
        role: Set(account.role.clone()),
        created_at: Set(account.created_at),
        updated_at: Set(account.updated_at),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

/// Unique-index violations mean another account already owns the identity.
fn save_err(e: sea_orm::DbErr, account: &Account) -> DomainError {
    let msg = e.to_string();
    if msg.contains("UNIQUE") || msg.contains("duplicate") {
        if msg.contains("email") {
            DomainError::DuplicateIdentity {
                field: "email",
                value: account.email.clone(),
            }
        } else {
            DomainError::DuplicateIdentity {
                field: "username",
                value: account.username.clone(),
            }
        }
    } else {
        db_err(e)
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl AccountRepositoryInterface for AccountRepository {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> DomainResult<Option<Account>> {
        let model = user::Entity::find()
            .filter(
                user::Column::Username
                    .eq(username)
                    .or(user::Column::Email.eq(email)),
            )
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<Account>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<Account>> {
        let model = user::Entity::find()
            .filter(user::Column::Token.eq(token))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn save(&self, account: &Account) -> DomainResult<()> {
        let upsert = OnConflict::column(user::Column::Id)
            .update_columns([
                user::Column::Username,
                user::Column::Email,
                user::Column::PasswordHash,
                user::Column::Token,
                user::Column::Role,
                user::Column::UpdatedAt,
            ])
            .to_owned();

        user::Entity::insert(domain_to_active_model(account))
            .on_conflict(upsert)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| save_err(e, account))?;

        Ok(())
    }

    async fn delete_by_username(&self, username: &str) -> DomainResult<()> {
        user::Entity::delete_many()
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn find_all(&self) -> DomainResult<BoxStream<'_, DomainResult<Account>>> {
        let rows = user::Entity::find()
            .stream(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows
            .map(|row| row.map(user_model_to_domain).map_err(db_err))
            .boxed())
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }
}
