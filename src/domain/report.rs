use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::perf::PerfReport;
use crate::domain::comparison::ComparisonResult;
use crate::domain::fingerprint::{fingerprint, Fingerprint};
use crate::domain::scope::ScopeSelector;
use crate::domain::snapshot::{FetchFailure, SchemaSnapshot};
use crate::domain::value_objects::{Category, Side};

/// What one side of the comparison was, for report headers.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SideInfo {
    pub side: Side,
    /// Database driver: "postgres", "mysql", "mariadb", "sqlite", or "snapshot"
    /// when the structure was loaded from a file.
    pub driver: String,
    pub database: String,
    pub fingerprint: Fingerprint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fetch_failures: Vec<FetchFailure>,
}

impl SideInfo {
    pub fn describe(side: Side, driver: &str, snapshot: &SchemaSnapshot) -> Self {
        let database = snapshot
            .database_info
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        SideInfo {
            side,
            driver: driver.to_string(),
            database,
            fingerprint: fingerprint(snapshot),
            fetch_failures: snapshot.fetch_failures.clone(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub report_id: String,
    pub created_at: String,
    pub a: SideInfo,
    pub b: SideInfo,
    pub scope: ScopeSelector,
    pub comparison_result: ComparisonResult,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perf: Option<PerfReport>,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub database_info_differences: usize,
    pub tables_only_in_a: usize,
    pub tables_only_in_b: usize,
    pub tables_in_both: usize,
    pub tables_with_differences: usize,
    pub procedures_only_in_a: usize,
    pub procedures_only_in_b: usize,
    pub procedures_with_differences: usize,
    pub fetch_failures: usize,
}

impl Summary {
    /// Count the outcome of one comparison. Database info differences only
    /// count when `scope` selects the database section.
    pub fn of(result: &ComparisonResult, scope: &ScopeSelector) -> Self {
        let procs = result.stored_procedures.as_ref();
        let database_info_differences = if scope.includes(Category::DatabaseEncoding) {
            result.database_info.differences.len()
        } else {
            0
        };
        Summary {
            database_info_differences,
            tables_only_in_a: result.tables.only_in_a.len(),
            tables_only_in_b: result.tables.only_in_b.len(),
            tables_in_both: result.tables.in_both.len(),
            tables_with_differences: result
                .tables
                .in_both
                .iter()
                .filter(|t| !t.is_identical())
                .count(),
            procedures_only_in_a: procs.map_or(0, |p| p.only_in_a.len()),
            procedures_only_in_b: procs.map_or(0, |p| p.only_in_b.len()),
            procedures_with_differences: procs
                .map_or(0, |p| p.in_both.iter().filter(|c| c.has_differences).count()),
            fetch_failures: 0,
        }
    }

    /// `true` when any compared object differs between A and B.
    pub fn has_differences(&self) -> bool {
        self.database_info_differences > 0
            || self.tables_only_in_a > 0
            || self.tables_only_in_b > 0
            || self.tables_with_differences > 0
            || self.procedures_only_in_a > 0
            || self.procedures_only_in_b > 0
            || self.procedures_with_differences > 0
    }

    /// `true` when both databases were read completely and nothing differs.
    pub fn is_clean(&self) -> bool {
        !self.has_differences() && self.fetch_failures == 0
    }
}

impl ComparisonReport {
    pub fn new(
        a: SideInfo,
        b: SideInfo,
        scope: ScopeSelector,
        comparison_result: ComparisonResult,
    ) -> Self {
        let mut summary = Summary::of(&comparison_result, &scope);
        summary.fetch_failures = a.fetch_failures.len() + b.fetch_failures.len();

        ComparisonReport {
            report_id: format!(
                "cmp_{}_{}",
                Utc::now().format("%Y%m%d_%H%M%S"),
                Uuid::new_v4().simple()
            ),
            created_at: Utc::now().to_rfc3339(),
            a,
            b,
            scope,
            comparison_result,
            summary,
            perf: None,
        }
    }

    pub fn with_perf(mut self, perf: PerfReport) -> Self {
        self.perf = Some(perf);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::compare;
    use crate::domain::record::Record;
    use crate::domain::snapshot::TableSnapshot;
    use crate::domain::value_objects::Category;
    use serde_json::json;

    fn snapshot(tables: &[&str]) -> SchemaSnapshot {
        SchemaSnapshot {
            database_info: Record::from([("name".to_string(), json!("shop"))]),
            tables: tables.iter().map(|t| TableSnapshot::new("dbo", *t)).collect(),
            ..SchemaSnapshot::default()
        }
    }

    #[test]
    fn summary_counts_tables() {
        let a = snapshot(&["Users", "Legacy"]);
        let b = snapshot(&["Users", "Orders", "Items"]);
        let result = compare(&a, &b, &ScopeSelector::everything()).unwrap();
        let summary = Summary::of(&result, &ScopeSelector::everything());
        assert_eq!(summary.tables_only_in_a, 1);
        assert_eq!(summary.tables_only_in_b, 2);
        assert_eq!(summary.tables_in_both, 1);
        assert_eq!(summary.tables_with_differences, 0);
        assert!(!summary.is_clean());
    }

    #[test]
    fn report_carries_both_sides() {
        let mut a = snapshot(&["Users"]);
        a.fetch_failures.push(FetchFailure {
            category: Category::Triggers,
            object: "dbo.Users".into(),
            message: "denied".into(),
        });
        let b = snapshot(&["Users"]);
        let result = compare(&a, &b, &ScopeSelector::everything()).unwrap();

        let report = ComparisonReport::new(
            SideInfo::describe(Side::A, "postgres", &a),
            SideInfo::describe(Side::B, "postgres", &b),
            ScopeSelector::everything(),
            result,
        );

        assert!(report.report_id.starts_with("cmp_"));
        assert_eq!(report.a.database, "shop");
        assert_eq!(report.summary.fetch_failures, 1);
        assert!(!report.summary.has_differences());
        assert!(!report.summary.is_clean());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["a"]["side"], "a");
        assert_eq!(json["a"]["fetchFailures"][0]["category"], "triggers");
        assert!(json["b"].get("fetchFailures").is_none());
        assert!(json["comparisonResult"]["tables"]["inBoth"].is_array());
        assert!(json.get("perf").is_none());
    }

    #[test]
    fn database_info_differences_follow_the_encoding_flag() {
        let a = snapshot(&["Users"]);
        let mut b = snapshot(&["Users"]);
        b.database_info
            .insert("collation_name".to_string(), json!("Latin1_General_CI_AS"));

        let with_info = ScopeSelector {
            database_encoding: true,
            ..ScopeSelector::default()
        };
        let result = compare(&a, &b, &with_info).unwrap();
        let summary = Summary::of(&result, &with_info);
        assert_eq!(summary.database_info_differences, 1);
        assert!(!summary.is_clean());

        let without_info = ScopeSelector::default();
        let result = compare(&a, &b, &without_info).unwrap();
        assert_eq!(result.database_info.differences.len(), 1);
        let summary = Summary::of(&result, &without_info);
        assert_eq!(summary.database_info_differences, 0);
        assert!(summary.is_clean());
    }
}
