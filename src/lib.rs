use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of schemadiff's internal tracing output.
///
/// Pass to [`init_tracing`] before calling any async entry point.
///
/// | Variant | `tracing` level | When to use                              |
/// |---------|-----------------|------------------------------------------|
/// | `Error` | `error`         | `--quiet` / CI scripting                 |
/// | `Info`  | `info`          | Default, shows connections and totals    |
/// | `Debug` | `debug`         | `--verbose`, shows every catalog query   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber for schemadiff.
///
/// It respects `RUST_LOG` when set, falling back to `level` otherwise.
/// Call this **once** at application startup. Library consumers who manage
/// their own subscriber should skip this.
///
/// Only available when the `cli` feature is enabled (pulls in
/// `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "schemadiff=error",
        LogLevel::Info => "schemadiff=info",
        LogLevel::Debug => "schemadiff=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use domain::perf::{OpTiming, PerfReport};
pub use domain::comparison::{compare, compare_with, ComparisonResult, TableComparison};
pub use domain::error::CompareError;
pub use domain::fingerprint::{fingerprint, Fingerprint};
pub use domain::outcome::Outcome;
pub use domain::reconcile::{compare_objects, ComparisonNode, KeylessPolicy, Presence, RecordNode};
pub use domain::record::{compare_record, ObjectComparison, Record};
pub use domain::report::{ComparisonReport, SideInfo, Summary};
pub use domain::scope::ScopeSelector;
pub use domain::snapshot::{FetchFailure, SchemaSnapshot, TableSnapshot};
pub use domain::value_objects::{Category, SchemaName, Side, TableName};
pub use infrastructure::config::{AppConfig, CompareConfig, DbConfig, OutputConfig};

use crate::application::compare::{compare_snapshots, CompareService, SchemaComparator};
use crate::application::monitoring::{MonitoringCatalogRepository, MonitoringDiffer};
use crate::application::session::{connect_pair, Session};
use crate::application::snapshot::SnapshotService;
use crate::domain::ports::CatalogRepository;
use crate::infrastructure::db::client::{self, SqlxConnector};

// ─── Public entry points ───

/// Compare the two databases configured in `cfg`.
///
/// Use [`run_with_timing`] if you also want a performance report.
pub async fn run(cfg: &AppConfig) -> Result<ComparisonReport> {
    let (report, _) = run_with_timing(cfg).await?;
    Ok(report)
}

/// Compare the two configured databases and time every catalog read.
///
/// Both connections are released before returning, whether the comparison
/// succeeded or not.
pub async fn run_with_timing(cfg: &AppConfig) -> Result<(ComparisonReport, PerfReport)> {
    let pair = connect_pair(&SqlxConnector, &cfg.db_a, &cfg.db_b).await?;

    let result = match (pair.a().connection(), pair.b().connection()) {
        (Some(a), Some(b)) => {
            let report = PerfReport::new();
            let service = CompareService::new(
                monitored(a.clone(), &report),
                monitored(b.clone(), &report),
                Arc::new(MonitoringDiffer::new(
                    Arc::new(SchemaComparator::new(cfg.compare.keyless)),
                    Arc::clone(&report),
                )),
            );
            service
                .run_compare(&cfg.scope)
                .await
                .map(|r| (r, PerfReport::snapshot(&report)))
        }
        _ => Err(anyhow::anyhow!("Database sessions are not connected")),
    };

    pair.disconnect(&SqlxConnector).await;
    result
}

/// Capture the structure of one configured database.
pub async fn snapshot(cfg: &AppConfig, side: Side) -> Result<SchemaSnapshot> {
    let mut session = Session::new(side);
    session.connect(&SqlxConnector, cfg.db(side)).await?;

    let result = match session.connection() {
        Some(repo) => {
            SnapshotService::new(Arc::new(repo.clone()))
                .capture(&cfg.scope)
                .await
        }
        None => Err(anyhow::anyhow!("Database {side} is not connected")),
    };

    session.disconnect(&SqlxConnector).await;
    result
}

/// Check that one configured database is reachable.
pub async fn test_connection(cfg: &AppConfig, side: Side) -> Result<()> {
    client::test_connection(cfg.db(side))
        .await
        .with_context(|| format!("Failed to connect to database {side}"))
}

/// Read a snapshot previously written as JSON.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<SchemaSnapshot> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))
}

/// Compare two snapshot files without connecting to any database.
pub fn compare_snapshot_files(
    path_a: impl AsRef<Path>,
    path_b: impl AsRef<Path>,
    scope: &ScopeSelector,
    keyless: KeylessPolicy,
) -> Result<ComparisonReport> {
    let a = load_snapshot(path_a)?;
    let b = load_snapshot(path_b)?;
    compare_snapshots(
        &SchemaComparator::new(keyless),
        ("snapshot", &a),
        ("snapshot", &b),
        scope,
    )
}

// ─── Private helpers ───────────────────────────────────────────────────────────

/// Wrap a connected repository in the monitoring decorator.
///
/// The shared `report` accumulates timings from both sides of the same run.
fn monitored(
    repo: client::SqlxCatalogRepository,
    report: &Arc<std::sync::Mutex<PerfReport>>,
) -> Arc<dyn CatalogRepository> {
    Arc::new(MonitoringCatalogRepository::new(
        Arc::new(repo),
        Arc::clone(report),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_snapshot(dir: &tempfile::TempDir, name: &str, snapshot: &SchemaSnapshot) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string(snapshot).unwrap()).unwrap();
        path
    }

    #[test]
    fn compares_snapshot_files() {
        let mut users = TableSnapshot::new("dbo", "Users");
        users.columns = vec![Record::from([("column_name".to_string(), json!("id"))])];
        let a = SchemaSnapshot {
            tables: vec![users],
            ..SchemaSnapshot::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let path_a = write_snapshot(&dir, "a.json", &a);
        let path_b = write_snapshot(&dir, "b.json", &SchemaSnapshot::default());

        let report = compare_snapshot_files(
            &path_a,
            &path_b,
            &ScopeSelector::everything(),
            KeylessPolicy::Drop,
        )
        .unwrap();
        assert_eq!(report.a.driver, "snapshot");
        assert_eq!(report.summary.tables_only_in_a, 1);
        assert_eq!(load_snapshot(&path_a).unwrap(), a);
    }

    #[test]
    fn minimal_snapshot_json_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("min.json");
        std::fs::write(
            &path,
            r#"{"databaseInfo": {"name": "shop"}, "tables": [{"schemaName": "dbo", "tableName": "T", "columns": null}]}"#,
        )
        .unwrap();
        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.tables[0].qualified_name(), "dbo.T");
        assert!(snapshot.tables[0].columns.is_empty());
    }

    #[test]
    fn unreadable_snapshot_is_reported() {
        let err = load_snapshot("/nonexistent/a.json").unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read snapshot file"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse snapshot file"));
    }
}
