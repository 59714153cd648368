//! Shared application state

use crate::{
    config::Config,
    db::{
        AssociationStore, BusinessStore, InMemoryTopoStore, PostgresAssociationStore,
        PostgresBusinessStore, PostgresSchemaResolver, SchemaResolver, StaticSchemaResolver,
    },
    services::{AssociationGuard, BusinessService, SearchPolicy},
    Error, Result,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// sqlx-backed stores over the configured database.
    Postgres,
    /// Process-local stores (useful for tests).
    Memory,
}

impl StorageBackend {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Internal(format!(
                "Unknown storage backend '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppStateOptions {
    pub run_migrations: bool,
    pub backend: StorageBackend,
}

impl AppStateOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            run_migrations: config.database.run_migrations,
            backend: StorageBackend::parse(&config.storage.backend)?,
        })
    }
}

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` on the in-memory backend.
    pub db_pool: Option<PgPool>,
    pub business_service: Arc<BusinessService>,
    /// Set on the in-memory backend so tests can seed associations.
    pub memory_store: Option<Arc<InMemoryTopoStore>>,
}

impl AppState {
    /// Initialize the application state
    pub async fn new(config: Config) -> Result<Self> {
        let options = AppStateOptions::from_config(&config)?;
        Self::new_with_options(config, options).await
    }

    pub async fn new_with_options(config: Config, options: AppStateOptions) -> Result<Self> {
        tracing::info!(backend = ?options.backend, "Initializing application state...");

        match options.backend {
            StorageBackend::Memory => Ok(Self::in_memory(config)),
            StorageBackend::Postgres => {
                let db_pool = create_db_pool(&config).await?;

                if options.run_migrations {
                    tracing::info!("Running database migrations...");
                    sqlx::migrate!("./migrations").run(&db_pool).await?;
                }

                let schemas: Arc<dyn SchemaResolver> =
                    Arc::new(PostgresSchemaResolver::new(db_pool.clone()));
                let businesses: Arc<dyn BusinessStore> =
                    Arc::new(PostgresBusinessStore::new(db_pool.clone()));
                let associations: Arc<dyn AssociationStore> =
                    Arc::new(PostgresAssociationStore::new(db_pool.clone()));

                let business_service = BusinessService::new(
                    schemas,
                    businesses,
                    AssociationGuard::new(associations),
                    SearchPolicy::from(&config.search),
                );

                tracing::info!("Application state initialized");
                Ok(Self {
                    config: Arc::new(config),
                    db_pool: Some(db_pool),
                    business_service: Arc::new(business_service),
                    memory_store: None,
                })
            }
        }
    }

    /// State over fresh in-memory stores and the built-in business schema.
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(InMemoryTopoStore::new());
        let business_service = BusinessService::new(
            Arc::new(StaticSchemaResolver::builtin()),
            store.clone(),
            AssociationGuard::new(store.clone()),
            SearchPolicy::from(&config.search),
        );

        Self {
            config: Arc::new(config),
            db_pool: None,
            business_service: Arc::new(business_service),
            memory_store: Some(store),
        }
    }
}

async fn create_db_pool(config: &Config) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let statement_timeout = config.database.statement_timeout_seconds;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.pool_timeout_seconds,
        ))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query(&format!("SET statement_timeout = '{}s'", statement_timeout))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database.url)
        .await
        .map_err(Error::Database)?;

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.database.pool_min_size,
        config.database.pool_max_size
    );

    Ok(pool)
}
