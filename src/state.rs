use std::sync::Arc;

use anyhow::Context;

use crate::auth::{
    jwt::JwtIssuer, password::Argon2Hasher, policy::PasswordPolicy, repo::PgAccountStore,
    services::AccountService,
};
use crate::{config::AppConfig, db};

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
}

impl AppState {
    /// Builds every collaborator from the config; token or hasher misconfiguration
    /// fails here, before the listener is bound.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let tokens = JwtIssuer::new(&config.jwt).context("initialize jwt issuer")?;
        let hasher = Argon2Hasher::new(&config.password).context("initialize password hasher")?;

        let pool = db::connect(&config.database).await?;
        db::migrate(&pool).await;
        let store = PgAccountStore::new(pool, config.database.statement_timeout());

        let accounts = AccountService::new(
            Arc::new(store),
            Arc::new(hasher),
            Arc::new(tokens),
            PasswordPolicy::from_config(&config.password),
        );
        Ok(Self::from_parts(accounts))
    }

    pub fn from_parts(accounts: AccountService) -> Self {
        Self {
            accounts: Arc::new(accounts),
        }
    }
}
