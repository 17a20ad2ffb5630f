use crate::domain::comparison::ComparisonResult;
use crate::domain::error::CompareError;
use crate::domain::perf::{OpTiming, PerfReport};
use crate::domain::ports::{CatalogRepository, SchemaDiffer};
use crate::domain::record::Record;
use crate::domain::scope::ScopeSelector;
use crate::domain::snapshot::SchemaSnapshot;
use crate::domain::value_objects::{Category, SchemaName, TableName};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, instrument};

// ─── MonitoringCatalogRepository ─────────────────────────────────────────────

/// Decorator: wraps any `CatalogRepository`, measures wall time per catalog
/// read, and appends the result to the shared `PerfReport`.
pub struct MonitoringCatalogRepository {
    inner: Arc<dyn CatalogRepository>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringCatalogRepository {
    pub fn new(inner: Arc<dyn CatalogRepository>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }

    fn track(&self, operation: &'static str, object: String, start: Instant, rows: usize) {
        let duration_ms = start.elapsed().as_millis();
        debug!(operation, object = %object, rows, duration_ms, "catalog read completed");
        PerfReport::record(
            &self.report,
            OpTiming {
                operation,
                object,
                duration_ms,
                rows,
            },
        );
    }
}

#[async_trait]
impl CatalogRepository for MonitoringCatalogRepository {
    fn driver(&self) -> &str {
        self.inner.driver()
    }

    async fn database_info(&self) -> Result<Record> {
        let start = Instant::now();
        let info = self.inner.database_info().await?;
        self.track("database_info", "database".into(), start, 1);
        Ok(info)
    }

    #[instrument(name = "list_tables", skip(self), level = "info")]
    async fn list_tables(&self) -> Result<Vec<Record>> {
        let start = Instant::now();
        let tables = self.inner.list_tables().await?;
        info!(tables = tables.len(), "list_tables completed");
        self.track("list_tables", "tables".into(), start, tables.len());
        Ok(tables)
    }

    #[instrument(
        name = "table_objects",
        skip(self, category, schema, table),
        fields(db.schema = %schema.0, db.table = %table.0, category = %category),
        level = "debug"
    )]
    async fn table_objects(
        &self,
        category: Category,
        schema: &SchemaName,
        table: &TableName,
    ) -> Result<Vec<Record>> {
        let start = Instant::now();
        let records = self.inner.table_objects(category, schema, table).await?;
        self.track(
            "table_objects",
            format!("{}.{} {}", schema.0, table.0, category),
            start,
            records.len(),
        );
        Ok(records)
    }

    async fn stored_procedures(&self) -> Result<Vec<Record>> {
        let start = Instant::now();
        let procs = self.inner.stored_procedures().await?;
        self.track("stored_procedures", "database".into(), start, procs.len());
        Ok(procs)
    }
}

// ─── MonitoringDiffer ────────────────────────────────────────────────────────

/// Decorator: wraps any `SchemaDiffer`, measures wall time per comparison,
/// and appends the result to the shared `PerfReport`.
pub struct MonitoringDiffer {
    inner: Arc<dyn SchemaDiffer>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringDiffer {
    pub fn new(inner: Arc<dyn SchemaDiffer>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

impl SchemaDiffer for MonitoringDiffer {
    #[instrument(
        name = "compare",
        skip(self, a, b, scope),
        fields(a.tables = a.tables.len(), b.tables = b.tables.len()),
        level = "info"
    )]
    fn diff(
        &self,
        a: &SchemaSnapshot,
        b: &SchemaSnapshot,
        scope: &ScopeSelector,
    ) -> std::result::Result<ComparisonResult, CompareError> {
        let start = Instant::now();
        let result = self.inner.diff(a, b, scope)?;
        let duration_ms = start.elapsed().as_millis();

        info!(
            only_in_a = result.tables.only_in_a.len(),
            only_in_b = result.tables.only_in_b.len(),
            in_both = result.tables.in_both.len(),
            duration_ms,
            "compare completed"
        );

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "compare",
                object: "schema".into(),
                duration_ms,
                rows: a.tables.len() + b.tables.len(),
            },
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::compare::SchemaComparator;
    use crate::domain::snapshot::{SnapshotCatalog, TableSnapshot};
    use serde_json::json;

    fn catalog() -> Arc<dyn CatalogRepository> {
        let mut users = TableSnapshot::new("dbo", "Users");
        users.columns = vec![
            Record::from([("column_name".to_string(), json!("id"))]),
            Record::from([("column_name".to_string(), json!("email"))]),
        ];
        Arc::new(SnapshotCatalog::new(
            "snapshot",
            SchemaSnapshot {
                tables: vec![users],
                ..SchemaSnapshot::default()
            },
        ))
    }

    #[tokio::test]
    async fn repository_reads_are_timed() {
        let report = PerfReport::new();
        let repo = MonitoringCatalogRepository::new(catalog(), Arc::clone(&report));

        repo.list_tables().await.unwrap();
        repo.table_objects(
            Category::Fields,
            &SchemaName("dbo".into()),
            &TableName("Users".into()),
        )
        .await
        .unwrap();

        let perf = PerfReport::snapshot(&report);
        assert_eq!(perf.timings.len(), 2);
        assert_eq!(perf.timings[0].operation, "list_tables");
        assert_eq!(perf.timings[1].object, "dbo.Users columns");
        assert_eq!(perf.total_rows_fetched, 3);
        assert_eq!(repo.driver(), "snapshot");
    }

    #[test]
    fn comparisons_are_timed_but_not_counted_as_fetched() {
        let report = PerfReport::new();
        let differ = MonitoringDiffer::new(Arc::new(SchemaComparator::default()), Arc::clone(&report));

        let s = SchemaSnapshot {
            tables: vec![TableSnapshot::new("dbo", "Users")],
            ..SchemaSnapshot::default()
        };
        let result = differ.diff(&s, &s, &ScopeSelector::everything()).unwrap();
        assert_eq!(result.tables.in_both.len(), 1);

        let perf = PerfReport::snapshot(&report);
        assert_eq!(perf.timings[0].operation, "compare");
        assert_eq!(perf.timings[0].rows, 2);
        assert_eq!(perf.total_rows_fetched, 0);
    }
}
