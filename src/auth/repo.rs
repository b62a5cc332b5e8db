use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::Account;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("store call exceeded {0:?}")]
    TimedOut(Duration),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable email -> account mapping. The unique constraint on `email` is what
/// `create_account` enforces; callers must not rely on a prior lookup alone.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `StoreError::DuplicateEmail` if the email is taken.
    async fn create_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Cheap liveness check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
    statement_timeout: Duration,
}

impl PgAccountStore {
    pub fn new(db: PgPool, statement_timeout: Duration) -> Self {
        Self {
            db,
            statement_timeout,
        }
    }

    /// Dropping the query future on timeout cancels the statement.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.statement_timeout, fut).await {
            Ok(res) => res.map_err(classify),
            Err(_) => Err(StoreError::TimedOut(self.statement_timeout)),
        }
    }
}

fn classify(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::DuplicateEmail,
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO accounts (id, name, email, password_hash, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(account.id)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(account.created_at)
            .bind(account.updated_at)
            .execute(&self.db),
        )
        .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.bounded(
            sqlx::query_as::<_, Account>(
                r#"
                SELECT id, name, email, password_hash, created_at, updated_at
                FROM accounts
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.db),
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.bounded(
            sqlx::query_as::<_, Account>(
                r#"
                SELECT id, name, email, password_hash, created_at, updated_at
                FROM accounts
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.db),
        )
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(sqlx::query("SELECT 1").execute(&self.db))
            .await
            .map(|_| ())
    }
}
