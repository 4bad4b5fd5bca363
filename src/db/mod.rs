use crate::models::ServiceType;
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::prelude::SchemaManager;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub mod repositories;
pub mod schema;

pub use repositories::cache::StoreOutcome;
pub use schema::{SchemaReport, StepOutcome};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        let store = Self { conn };

        // Runs on every open so a step that failed on an earlier boot is retried.
        let report = store.ensure_schema().await;
        if !report.is_complete() {
            warn!("Cache schema is incomplete, writes may fail: {:?}", report);
        }

        info!(
            "Database connected & schema checked (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(store)
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Re-runs the idempotent schema steps and reports what each one did.
    pub async fn ensure_schema(&self) -> SchemaReport {
        let manager = SchemaManager::new(&self.conn);
        schema::ensure_schema(&manager).await
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    pub async fn lookup(
        &self,
        query: &str,
        service: ServiceType,
    ) -> Result<Option<serde_json::Value>> {
        self.cache_repo().lookup(query, service).await
    }

    pub async fn store(
        &self,
        query: &str,
        service: ServiceType,
        payload: &serde_json::Value,
    ) -> Result<StoreOutcome> {
        self.cache_repo().store(query, service, payload).await
    }
}
