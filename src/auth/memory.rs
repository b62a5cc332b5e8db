use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo::{AccountStore, StoreError};
use crate::auth::repo_types::Account;

/// In-memory `AccountStore` for tests. Email uniqueness is enforced under the same
/// lock as the insert, like a unique index.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
    create_calls: AtomicUsize,
    stale_lookups: AtomicBool,
    outage: AtomicBool,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn count_email(&self, email: &str) -> usize {
        self.accounts
            .lock()
            .expect("store lock")
            .values()
            .filter(|a| a.email == email)
            .count()
    }

    /// Makes `find_by_email` miss existing rows, as if another request inserted the
    /// same email between the lookup and the insert.
    pub fn simulate_stale_lookups(&self) {
        self.stale_lookups.store(true, Ordering::SeqCst);
    }

    pub fn simulate_outage(&self) {
        self.outage.store(true, Ordering::SeqCst);
    }

    fn check_outage(&self) -> Result<(), StoreError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_outage()?;
        let mut accounts = self.accounts.lock().expect("store lock");
        if accounts.contains_key(&account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        accounts.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.check_outage()?;
        if self.stale_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.accounts.lock().expect("store lock").get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.check_outage()?;
        Ok(self
            .accounts
            .lock()
            .expect("store lock")
            .values()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_outage()
    }
}
