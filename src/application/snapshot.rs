use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::ports::CatalogRepository;
use crate::domain::record::Record;
use crate::domain::scope::ScopeSelector;
use crate::domain::snapshot::{FetchFailure, SchemaSnapshot, TableSnapshot};
use crate::domain::value_objects::{Category, SchemaName, TableName};

// ─────────────────────────────────────────────────────────────────────────────
// SnapshotService
// ─────────────────────────────────────────────────────────────────────────────

/// Reads the structure of one database into a [`SchemaSnapshot`].
///
/// Only the categories selected by the scope are fetched. Failing to read the
/// database info or the table list aborts the capture. Any other read that
/// fails (one category of one table, or the procedure list) is replaced by an
/// empty collection and recorded in `fetch_failures`, since the rest of the
/// structure is still worth comparing.
pub struct SnapshotService {
    repo: Arc<dyn CatalogRepository>,
}

impl SnapshotService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "capture", skip(self, scope), fields(driver = %self.repo.driver()))]
    pub async fn capture(&self, scope: &ScopeSelector) -> Result<SchemaSnapshot> {
        let database_info = self
            .repo
            .database_info()
            .await
            .context("Failed to get database info")?;

        let mut snapshot = SchemaSnapshot {
            database_info,
            ..SchemaSnapshot::default()
        };

        if !scope.includes(Category::Tables) && scope.includes_table_objects() {
            warn!("per-table categories are selected without tables; no table will be read");
        }

        if scope.includes(Category::Tables) {
            let rows = self
                .repo
                .list_tables()
                .await
                .context("Failed to get tables")?;
            let total = rows.len();

            for (i, row) in rows.iter().enumerate() {
                let (Some(schema), Some(table)) = (text(row, "schema_name"), text(row, "table_name"))
                else {
                    let row = serde_json::to_string(row).unwrap_or_default();
                    warn!(%row, "skipping table without schema or name");
                    continue;
                };
                debug!(table = %format!("{schema}.{table}"), "{}/{}", i + 1, total);
                let table = self.capture_table(schema, table, scope, &mut snapshot.fetch_failures).await;
                snapshot.tables.push(table);
            }
        }

        if scope.includes(Category::StoredProcedures) {
            let procedures = match self.repo.stored_procedures().await {
                Ok(procs) => procs,
                Err(err) => {
                    recover(
                        &mut snapshot.fetch_failures,
                        Category::StoredProcedures,
                        "database".to_string(),
                        &err,
                    );
                    Vec::new()
                }
            };
            snapshot.stored_procedures = Some(procedures);
        }

        info!(
            tables = snapshot.tables.len(),
            failures = snapshot.fetch_failures.len(),
            "snapshot captured"
        );
        Ok(snapshot)
    }

    async fn capture_table(
        &self,
        schema: String,
        table: String,
        scope: &ScopeSelector,
        failures: &mut Vec<FetchFailure>,
    ) -> TableSnapshot {
        let mut snapshot = TableSnapshot::new(schema, table);
        let schema_name = SchemaName(snapshot.schema_name.clone());
        let table_name = TableName(snapshot.table_name.clone());

        for category in Category::TABLE_OBJECTS {
            if !scope.includes(category) {
                continue;
            }
            match self
                .repo
                .table_objects(category, &schema_name, &table_name)
                .await
            {
                Ok(records) => {
                    if let Some(slot) = snapshot.objects_mut(category) {
                        *slot = records;
                    }
                }
                Err(err) => recover(failures, category, snapshot.qualified_name(), &err),
            }
        }
        snapshot
    }
}

fn recover(failures: &mut Vec<FetchFailure>, category: Category, object: String, err: &anyhow::Error) {
    let failure = FetchFailure {
        category,
        object,
        message: format!("{err:#}"),
    };
    warn!(error = %failure.to_error(), "continuing with an empty collection");
    failures.push(failure);
}

fn text(row: &Record, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
