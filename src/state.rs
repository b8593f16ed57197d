use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::{
    config::AppConfig,
    memory::{MemoryDocumentRepo, MemoryUserRepo},
    resources::repo::{DocumentRepo, PgDocumentRepo},
    users::repo::{PgUserRepo, UserRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub documents: Arc<dyn DocumentRepo>,
    /// `None` when running on the in-memory store.
    pool: Option<PgPool>,
}

impl AppState {
    /// Opens the store named by `DATABASE_URL`.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        if config.uses_memory_store() {
            info!("using in-memory store; data will not survive a restart");
            return Ok(Self::in_memory(config));
        }

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to postgres")?;
        info!(max_connections = config.max_connections, "postgres pool ready");

        Ok(Self {
            config: Arc::new(config),
            users: Arc::new(PgUserRepo::new(db.clone())),
            documents: Arc::new(PgDocumentRepo::new(db.clone())),
            pool: Some(db),
        })
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            users: Arc::new(MemoryUserRepo::new()),
            documents: Arc::new(MemoryDocumentRepo::new()),
            pool: None,
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Releases the store handle. Called once after the server stops.
    pub async fn close(&self) {
        if let Some(db) = &self.pool {
            db.close().await;
            info!("postgres pool closed");
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake() -> Self {
        Self::in_memory(fake_config(crate::config::Environment::Development))
    }

    pub fn fake_production() -> Self {
        Self::in_memory(fake_config(crate::config::Environment::Production))
    }
}

#[cfg(test)]
fn fake_config(environment: crate::config::Environment) -> AppConfig {
    AppConfig {
        database_url: "memory://".into(),
        max_connections: 1,
        jwt: crate::config::JwtConfig {
            secret: "test".into(),
            issuer: "test".into(),
            audience: "test".into(),
            ttl_seconds: 3600,
        },
        host: "127.0.0.1".into(),
        port: 0,
        environment,
        admin: None,
    }
}
