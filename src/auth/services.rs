use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    dto::PublicAccount,
    jwt::TokenIssuer,
    password::{PasswordError, PasswordHasher},
    policy::{PasswordPolicy, PolicyError},
    repo::{AccountStore, StoreError},
    repo_types::Account,
};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    PolicyViolation(#[from] PolicyError),
    #[error("email already registered")]
    AccountExists,
    #[error("account not found")]
    AccountNotFound,
    #[error("incorrect password")]
    InvalidCredentials,
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AccountError::AccountExists,
            other => AccountError::StorageFailure(other),
        }
    }
}

/// Registration and login on top of the injected store, hasher and token issuer.
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    policy: PasswordPolicy,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// The email lookup is only a fast path; the store's unique constraint decides
    /// when two registrations race.
    #[instrument(skip(self, name, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicAccount, AccountError> {
        if self.store.find_by_email(email).await?.is_some() {
            warn!("email already registered");
            return Err(AccountError::AccountExists);
        }

        if let Err(e) = self.policy.validate(password) {
            warn!(reason = %e, "password rejected by policy");
            return Err(e.into());
        }

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| AccountError::Internal(e.into()))?;

        let now = OffsetDateTime::now_utc();
        let account = Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: now,
            updated_at: now,
        };

        match self.store.create_account(&account).await {
            Ok(()) => {}
            Err(StoreError::DuplicateEmail) => {
                warn!("email registered concurrently");
                return Err(AccountError::AccountExists);
            }
            Err(e) => {
                error!(error = %e, "create account failed");
                return Err(AccountError::StorageFailure(e));
            }
        }

        info!(account_id = %account.id, "account registered");
        Ok(PublicAccount::from(&account))
    }

    /// Returns a signed session token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let account = match self.store.find_by_email(email).await? {
            Some(a) => a,
            None => {
                warn!("login unknown email");
                return Err(AccountError::AccountNotFound);
            }
        };

        match self.hasher.verify(&account.password_hash, password) {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => {
                warn!(account_id = %account.id, "login invalid password");
                return Err(AccountError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, account_id = %account.id, "verify_password failed");
                return Err(AccountError::Internal(e.into()));
            }
        }

        let token = self.tokens.create_token(account.id).map_err(|e| {
            error!(error = %e, "jwt sign failed");
            AccountError::Internal(e.into())
        })?;

        info!(account_id = %account.id, "account logged in");
        Ok(token)
    }
}
