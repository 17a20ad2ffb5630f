use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::application::session::Connector;
use crate::domain::ports::CatalogRepository;
use crate::domain::record::Record;
use crate::domain::value_objects::{Category, SchemaName, TableName};
use crate::infrastructure::config::DbConfig;
use crate::infrastructure::db::dialect::{from_driver, CatalogDialect};
use crate::infrastructure::db::row_mapper::row_to_record;

/// Catalog reader over a sqlx `AnyPool`. Cloning shares the pool.
#[derive(Clone)]
pub struct SqlxCatalogRepository {
    pool: AnyPool,
    dialect: Arc<dyn CatalogDialect>,
}

/// Connect to the database described in `cfg` and return a `SqlxCatalogRepository`.
pub async fn connect(cfg: &DbConfig) -> Result<SqlxCatalogRepository> {
    sqlx::any::install_default_drivers();

    let mut options = AnyPoolOptions::new().max_connections(cfg.max_connections.max(1));
    if let Some(secs) = cfg.timeout_secs {
        options = options.acquire_timeout(Duration::from_secs(secs));
    }

    let pool = options.connect(&cfg.url()).await.with_context(|| {
        format!(
            "Failed to connect to {} (driver: {})",
            cfg.display_name(),
            cfg.driver
        )
    })?;

    debug!(
        "Connected to {} via {} driver",
        cfg.display_name(),
        cfg.driver
    );

    Ok(SqlxCatalogRepository {
        pool,
        dialect: Arc::from(from_driver(&cfg.driver)),
    })
}

/// Open a connection, run a trivial query, and close it again.
pub async fn test_connection(cfg: &DbConfig) -> Result<()> {
    let repo = connect(cfg).await?;
    let result = sqlx::query("SELECT 1")
        .fetch_one(&repo.pool)
        .await
        .with_context(|| format!("Test query failed on {}", cfg.display_name()));
    repo.close().await;
    result.map(|_| ())
}

impl SqlxCatalogRepository {
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch(&self, sql: &str, binds: &[&str]) -> Result<Vec<Record>> {
        debug!("Executing: {}", sql);

        let mut query = sqlx::query(sql);
        for value in binds {
            query = query.bind(value.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }
}

#[async_trait]
impl CatalogRepository for SqlxCatalogRepository {
    fn driver(&self) -> &str {
        self.dialect.name()
    }

    async fn database_info(&self) -> Result<Record> {
        let mut rows = self
            .fetch(self.dialect.database_info_sql(), &[])
            .await
            .context("Failed to query database info")?;
        if rows.is_empty() {
            anyhow::bail!("Database info query returned no rows");
        }
        Ok(rows.swap_remove(0))
    }

    async fn list_tables(&self) -> Result<Vec<Record>> {
        self.fetch(self.dialect.tables_sql(), &[])
            .await
            .context("Failed to query tables")
    }

    async fn table_objects(
        &self,
        category: Category,
        schema: &SchemaName,
        table: &TableName,
    ) -> Result<Vec<Record>> {
        let Some(sql) = self.dialect.objects_sql(category) else {
            return Ok(Vec::new());
        };
        let binds: Vec<&str> = if self.dialect.binds_schema() {
            vec![schema.0.as_str(), table.0.as_str()]
        } else {
            vec![table.0.as_str()]
        };
        self.fetch(sql, &binds)
            .await
            .with_context(|| format!("Failed to query {} for {}.{}", category, schema.0, table.0))
    }

    async fn stored_procedures(&self) -> Result<Vec<Record>> {
        let Some(sql) = self.dialect.procedures_sql() else {
            return Ok(Vec::new());
        };
        self.fetch(sql, &[])
            .await
            .context("Failed to query stored procedures")
    }
}

// ─── Connector for session management ───

/// Opens pooled sqlx connections for [`crate::application::session`].
#[derive(Default, Clone, Copy)]
pub struct SqlxConnector;

#[async_trait]
impl Connector for SqlxConnector {
    type Connection = SqlxCatalogRepository;

    async fn open(&self, cfg: &DbConfig) -> Result<SqlxCatalogRepository> {
        connect(cfg).await
    }

    async fn close(&self, conn: &SqlxCatalogRepository) {
        conn.close().await;
    }
}
