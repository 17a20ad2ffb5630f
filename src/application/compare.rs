use anyhow::{Context, Result};
use std::sync::Arc;

use crate::application::snapshot::SnapshotService;
use crate::domain::comparison::{compare_with, ComparisonResult};
use crate::domain::error::CompareError;
use crate::domain::ports::{CatalogRepository, SchemaDiffer};
use crate::domain::reconcile::KeylessPolicy;
use crate::domain::report::{ComparisonReport, SideInfo};
use crate::domain::scope::ScopeSelector;
use crate::domain::snapshot::SchemaSnapshot;
use crate::domain::value_objects::Side;

// ─── Compare Service ───

/// Reads database A, then database B, then compares the two snapshots.
///
/// The reads are sequential; a failure on either side aborts the run.
pub struct CompareService {
    repo_a: Arc<dyn CatalogRepository>,
    repo_b: Arc<dyn CatalogRepository>,
    differ: Arc<dyn SchemaDiffer>,
}

impl CompareService {
    pub fn new(
        repo_a: Arc<dyn CatalogRepository>,
        repo_b: Arc<dyn CatalogRepository>,
        differ: Arc<dyn SchemaDiffer>,
    ) -> Self {
        Self {
            repo_a,
            repo_b,
            differ,
        }
    }

    pub async fn run_compare(&self, scope: &ScopeSelector) -> Result<ComparisonReport> {
        let snapshot_a = SnapshotService::new(Arc::clone(&self.repo_a))
            .capture(scope)
            .await
            .context("Failed to read the structure of database A")?;
        let snapshot_b = SnapshotService::new(Arc::clone(&self.repo_b))
            .capture(scope)
            .await
            .context("Failed to read the structure of database B")?;

        compare_snapshots(
            self.differ.as_ref(),
            (self.repo_a.driver(), &snapshot_a),
            (self.repo_b.driver(), &snapshot_b),
            scope,
        )
    }
}

/// Compare two already captured snapshots and wrap the result in a report.
/// Each side is given as `(driver, snapshot)`.
pub fn compare_snapshots(
    differ: &dyn SchemaDiffer,
    (driver_a, a): (&str, &SchemaSnapshot),
    (driver_b, b): (&str, &SchemaSnapshot),
    scope: &ScopeSelector,
) -> Result<ComparisonReport> {
    let result = differ
        .diff(a, b, scope)
        .context("Failed to compare databases")?;

    Ok(ComparisonReport::new(
        SideInfo::describe(Side::A, driver_a, a),
        SideInfo::describe(Side::B, driver_b, b),
        *scope,
        result,
    ))
}

// ─── Schema Comparator (implementation of the port) ───

#[derive(Default)]
pub struct SchemaComparator {
    keyless: KeylessPolicy,
}

impl SchemaComparator {
    pub fn new(keyless: KeylessPolicy) -> Self {
        Self { keyless }
    }
}

impl SchemaDiffer for SchemaComparator {
    fn diff(
        &self,
        a: &SchemaSnapshot,
        b: &SchemaSnapshot,
        scope: &ScopeSelector,
    ) -> std::result::Result<ComparisonResult, CompareError> {
        compare_with(a, b, scope, self.keyless)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;
    use crate::domain::snapshot::{SnapshotCatalog, TableSnapshot};
    use serde_json::json;

    fn column(name: &str, data_type: &str) -> Record {
        Record::from([
            ("column_name".to_string(), json!(name)),
            ("data_type".to_string(), json!(data_type)),
        ])
    }

    fn catalog(name: &str, tables: Vec<TableSnapshot>) -> Arc<dyn CatalogRepository> {
        Arc::new(SnapshotCatalog::new(
            "snapshot",
            SchemaSnapshot {
                database_info: Record::from([("name".to_string(), json!(name))]),
                tables,
                stored_procedures: Some(vec![]),
                fetch_failures: vec![],
            },
        ))
    }

    #[tokio::test]
    async fn run_compare_reads_both_sides() {
        let mut users_a = TableSnapshot::new("dbo", "Users");
        users_a.columns = vec![column("id", "int"), column("email", "varchar")];
        let mut users_b = TableSnapshot::new("dbo", "Users");
        users_b.columns = vec![column("id", "bigint"), column("email", "varchar")];

        let service = CompareService::new(
            catalog("shop_a", vec![users_a, TableSnapshot::new("dbo", "Legacy")]),
            catalog("shop_b", vec![users_b]),
            Arc::new(SchemaComparator::default()),
        );

        let report = service
            .run_compare(&ScopeSelector::everything())
            .await
            .unwrap();

        assert_eq!(report.a.database, "shop_a");
        assert_eq!(report.b.database, "shop_b");
        assert_eq!(report.summary.database_info_differences, 1);
        assert_eq!(report.summary.tables_only_in_a, 1);
        assert_eq!(report.summary.tables_with_differences, 1);
        assert_ne!(report.a.fingerprint, report.b.fingerprint);

        let users = &report.comparison_result.tables.in_both[0];
        assert!(users.has_differences);
        assert!(report.comparison_result.stored_procedures.is_some());
    }

    #[test]
    fn invalid_snapshot_is_rejected_before_comparing() {
        let good = SchemaSnapshot::default();
        let bad = SchemaSnapshot {
            tables: vec![TableSnapshot::new("dbo", "")],
            ..SchemaSnapshot::default()
        };
        let err = compare_snapshots(
            &SchemaComparator::default(),
            ("snapshot", &bad),
            ("snapshot", &good),
            &ScopeSelector::everything(),
        )
        .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to compare databases"), "got: {message}");
        assert!(message.contains("snapshot A"), "got: {message}");
    }

    #[test]
    fn comparator_applies_keyless_policy() {
        let keyless = Record::from([("type_desc".to_string(), json!("CHECK"))]);
        let mut t = TableSnapshot::new("dbo", "T");
        t.constraints = vec![keyless];
        let s = SchemaSnapshot {
            tables: vec![t],
            ..SchemaSnapshot::default()
        };

        let dropped = SchemaComparator::default()
            .diff(&s, &s, &ScopeSelector::everything())
            .unwrap();
        let node = dropped.tables.in_both[0].constraints.as_ref().unwrap();
        assert!(node.in_both.is_empty());

        let kept = SchemaComparator::new(KeylessPolicy::Synthesize)
            .diff(&s, &s, &ScopeSelector::everything())
            .unwrap();
        let node = kept.tables.in_both[0].constraints.as_ref().unwrap();
        assert_eq!(node.in_both.len(), 1);
    }
}
