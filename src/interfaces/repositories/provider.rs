use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    db::postgres::{create_pool, run_migrations},
    errors::AppError,
    repositories::{
        context::RequestContext,
        image::ImageRepository,
        memory_repo::{InMemoryImageRepo, MemoryStore},
        sqlx_repo::SqlxImageRepo,
    },
    settings::{AppConfig, RepositoryBackend},
};

/// Hands out one repository per request, each bound to that request's context.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn backend(&self) -> RepositoryBackend;

    fn scoped(&self, ctx: RequestContext) -> Box<dyn ImageRepository>;

    async fn check_connection(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SqlxRepositoryProvider {
    pub pool: PgPool,
    pub save_retry_attempts: u32,
}

impl SqlxRepositoryProvider {
    pub fn new(pool: PgPool, save_retry_attempts: u32) -> Self {
        SqlxRepositoryProvider { pool, save_retry_attempts }
    }
}

#[async_trait]
impl RepositoryProvider for SqlxRepositoryProvider {
    fn backend(&self) -> RepositoryBackend {
        RepositoryBackend::Postgres
    }

    fn scoped(&self, ctx: RequestContext) -> Box<dyn ImageRepository> {
        Box::new(SqlxImageRepo::new(self.pool.clone(), ctx, self.save_retry_attempts))
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }
}

#[derive(Clone, Default)]
pub struct MemoryRepositoryProvider {
    pub store: Arc<MemoryStore>,
}

impl MemoryRepositoryProvider {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        MemoryRepositoryProvider { store }
    }
}

#[async_trait]
impl RepositoryProvider for MemoryRepositoryProvider {
    fn backend(&self) -> RepositoryBackend {
        RepositoryBackend::Memory
    }

    fn scoped(&self, ctx: RequestContext) -> Box<dyn ImageRepository> {
        Box::new(InMemoryImageRepo::new(self.store.clone(), ctx))
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Builds the provider selected by `repository_backend`. For Postgres this
/// connects the pool and applies pending migrations.
pub async fn connect_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn RepositoryProvider>> {
    match config.repository_backend {
        RepositoryBackend::Postgres => {
            let pool = create_pool(&config.database_url, config.max_connections)
                .await
                .context("Failed to create database connection pool")?;
            run_migrations(&pool).await?;

            Ok(Arc::new(SqlxRepositoryProvider::new(pool, config.save_retry_attempts)))
        }
        RepositoryBackend::Memory => {
            tracing::warn!("Using the in-memory repository; data will not survive a restart");
            Ok(Arc::new(MemoryRepositoryProvider::default()))
        }
    }
}
