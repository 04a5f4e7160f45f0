use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{
    password::PasswordPolicy,
    repo::{CredentialStore, PgUserStore},
    services::AuthService,
};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run database migrations")?;
        tracing::info!("database ready");

        let policy = PasswordPolicy::from_config(&config.password)?;
        let store = Arc::new(PgUserStore::new(db)) as Arc<dyn CredentialStore>;

        Ok(Self::from_parts(config, store, policy))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn CredentialStore>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            config,
            auth: AuthService::new(store, policy),
        }
    }

    /// State backed by the in-memory store with cheap hashing parameters.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::auth::repo::MemoryUserStore;

        let config = Arc::new(
            AppConfig::from_lookup(|_| None).expect("default config parses"),
        );
        let store = Arc::new(MemoryUserStore::default()) as Arc<dyn CredentialStore>;
        Self::from_parts(config, store, PasswordPolicy::fast())
    }
}
