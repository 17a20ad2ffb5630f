use anyhow::Result;
use sailfish::TemplateOnce;

use crate::domain::comparison::{TableComparison, DATABASE_INFO_FIELDS};
use crate::domain::ports::OutputWriter;
use crate::domain::reconcile::RecordNode;
use crate::domain::record::{display_value, ObjectComparison, Record};
use crate::domain::report::ComparisonReport;
use crate::domain::value_objects::Category;

// ─── View types ───────────────────────────────────────────────────────────────
//
// Flattened, pre-formatted copies of the comparison tree so the template only
// has to loop and print.

struct FieldRow {
    field: String,
    a: String,
    b: String,
    differs: bool,
}

struct ObjectView {
    name: String,
    differences: Vec<FieldRow>,
}

struct CategoryView {
    title: &'static str,
    only_in_a: Vec<String>,
    only_in_b: Vec<String>,
    changed: Vec<ObjectView>,
    unchanged: usize,
}

impl CategoryView {
    fn is_clean(&self) -> bool {
        self.only_in_a.is_empty() && self.only_in_b.is_empty() && self.changed.is_empty()
    }
}

struct TableView {
    name: String,
    /// CSS class: "only-a", "only-b", "changed" or "same".
    class: &'static str,
    badge: &'static str,
    categories: Vec<CategoryView>,
}

#[derive(TemplateOnce)]
#[template(path = "html/report.stpl")] // base dir declared inside sailfish.toml
struct ReportTemplate<'a> {
    report: &'a ComparisonReport,
    /// `None` when the scope leaves the database section out.
    database_info: Option<Vec<FieldRow>>,
    tables: Vec<TableView>,
    procedures: Option<CategoryView>,
}

fn object_name(record: &Record, key_field: &str) -> String {
    record.get(key_field).map(display_value).unwrap_or_default()
}

fn category_view(title: &'static str, node: &RecordNode, key_field: &str) -> CategoryView {
    let changed: Vec<ObjectView> = node
        .in_both
        .iter()
        .filter(|c| c.has_differences)
        .map(|c| object_view(c, key_field))
        .collect();

    CategoryView {
        title,
        only_in_a: node
            .only_in_a
            .iter()
            .map(|t| object_name(&t.entity, key_field))
            .collect(),
        only_in_b: node
            .only_in_b
            .iter()
            .map(|t| object_name(&t.entity, key_field))
            .collect(),
        unchanged: node.in_both.len() - changed.len(),
        changed,
    }
}

fn object_view(comparison: &ObjectComparison, key_field: &str) -> ObjectView {
    ObjectView {
        name: comparison.label(key_field),
        differences: comparison
            .differences
            .iter()
            .map(|d| FieldRow {
                field: d.field.clone(),
                a: d.value_a.as_ref().map(display_value).unwrap_or_default(),
                b: d.value_b.as_ref().map(display_value).unwrap_or_default(),
                differs: true,
            })
            .collect(),
    }
}

fn table_view(table: &TableComparison) -> TableView {
    let categories = Category::TABLE_OBJECTS
        .into_iter()
        .filter_map(|category| {
            let key_field = category.key_field()?;
            table
                .category(category)
                .map(|node| category_view(category.as_str(), node, key_field))
        })
        .collect();

    let identical = table.is_identical();
    TableView {
        name: table.qualified_name(),
        class: if identical { "same" } else { "changed" },
        badge: if identical { "identical" } else { "differs" },
        categories,
    }
}

fn database_info_rows(report: &ComparisonReport) -> Vec<FieldRow> {
    let info = &report.comparison_result.database_info;
    let mut rows: Vec<FieldRow> = info
        .differences
        .iter()
        .map(|d| FieldRow {
            field: d.field.clone(),
            a: d.value_a.as_ref().map(display_value).unwrap_or_default(),
            b: d.value_b.as_ref().map(display_value).unwrap_or_default(),
            differs: true,
        })
        .chain(info.similarities.iter().map(|s| {
            let value = s.value.as_ref().map(display_value).unwrap_or_default();
            FieldRow {
                field: s.field.clone(),
                a: value.clone(),
                b: value,
                differs: false,
            }
        }))
        .collect();
    rows.sort_by_key(|r| {
        DATABASE_INFO_FIELDS
            .iter()
            .position(|f| *f == r.field)
            .unwrap_or(usize::MAX)
    });
    rows
}

fn build(report: &ComparisonReport) -> ReportTemplate<'_> {
    let result = &report.comparison_result;

    let mut tables: Vec<TableView> = Vec::new();
    tables.extend(result.tables.only_in_a.iter().map(|t| TableView {
        name: t.entity.to_string(),
        class: "only-a",
        badge: "only in A",
        categories: Vec::new(),
    }));
    tables.extend(result.tables.only_in_b.iter().map(|t| TableView {
        name: t.entity.to_string(),
        class: "only-b",
        badge: "only in B",
        categories: Vec::new(),
    }));
    tables.extend(result.tables.in_both.iter().map(table_view));

    ReportTemplate {
        report,
        database_info: report
            .scope
            .includes(Category::DatabaseEncoding)
            .then(|| database_info_rows(report)),
        tables,
        procedures: result
            .stored_procedures
            .as_ref()
            .map(|node| category_view("stored procedures", node, "procedure_name")),
    }
}

pub struct HtmlWriter;

impl OutputWriter for HtmlWriter {
    fn format(&self, report: &ComparisonReport) -> Result<String> {
        Ok(build(report).render_once()?)
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::comparison::compare;
    use crate::domain::report::SideInfo;
    use crate::domain::scope::ScopeSelector;
    use crate::domain::snapshot::{SchemaSnapshot, TableSnapshot};
    use crate::domain::value_objects::Side;
    use serde_json::json;

    fn report() -> ComparisonReport {
        report_with(ScopeSelector::everything())
    }

    fn report_with(scope: ScopeSelector) -> ComparisonReport {
        let mut users_a = TableSnapshot::new("dbo", "Users");
        users_a.columns = vec![Record::from([
            ("column_name".to_string(), json!("email")),
            ("max_length".to_string(), json!(100)),
        ])];
        let mut users_b = TableSnapshot::new("dbo", "Users");
        users_b.columns = vec![Record::from([
            ("column_name".to_string(), json!("email")),
            ("max_length".to_string(), json!(255)),
        ])];
        let a = SchemaSnapshot {
            database_info: Record::from([("name".to_string(), json!("shop<a>"))]),
            tables: vec![users_a, TableSnapshot::new("dbo", "Legacy")],
            stored_procedures: Some(vec![]),
            ..SchemaSnapshot::default()
        };
        let b = SchemaSnapshot {
            database_info: Record::from([("name".to_string(), json!("shop<a>"))]),
            tables: vec![users_b],
            stored_procedures: Some(vec![Record::from([(
                "procedure_name".to_string(),
                json!("usp_Cleanup"),
            )])]),
            ..SchemaSnapshot::default()
        };
        ComparisonReport::new(
            SideInfo::describe(Side::A, "postgres", &a),
            SideInfo::describe(Side::B, "postgres", &b),
            scope,
            compare(&a, &b, &scope).unwrap(),
        )
    }

    #[test]
    fn renders_tables_and_differences() {
        let report = report();
        let html = HtmlWriter.format(&report).unwrap();

        assert!(html.contains(&report.report_id));
        assert!(html.contains("dbo.Legacy"));
        assert!(html.contains("only in A"));
        assert!(html.contains("dbo.Users"));
        assert!(html.contains("max_length"));
        assert!(html.contains("255"));
        assert!(html.contains("usp_Cleanup"));
        // values are escaped
        assert!(html.contains("shop&lt;a&gt;"));
        assert!(!html.contains("shop<a>"));
    }

    #[test]
    fn view_orders_database_info_fields() {
        let report = report();
        let rows = database_info_rows(&report);
        assert_eq!(rows[0].field, "name");
        assert!(!rows[0].differs);
    }

    #[test]
    fn view_counts_unchanged_objects() {
        let report = report();
        let view = build(&report);
        let users = view.tables.iter().find(|t| t.name == "dbo.Users").unwrap();
        assert_eq!(users.class, "changed");
        let columns = &users.categories[0];
        assert_eq!(columns.title, "columns");
        assert_eq!(columns.changed.len(), 1);
        assert_eq!(columns.unchanged, 0);
        assert!(!columns.is_clean());

        let procs = view.procedures.unwrap();
        assert_eq!(procs.only_in_b, vec!["usp_Cleanup"]);
    }

    #[test]
    fn database_section_follows_the_encoding_flag() {
        let with_info = report();
        assert!(build(&with_info).database_info.is_some());
        assert!(HtmlWriter.format(&with_info).unwrap().contains("<h2>Database</h2>"));

        let without_info = report_with(ScopeSelector {
            tables: true,
            fields: true,
            ..ScopeSelector::default()
        });
        assert!(build(&without_info).database_info.is_none());
        let html = HtmlWriter.format(&without_info).unwrap();
        assert!(!html.contains("<h2>Database</h2>"));
        assert!(html.contains("dbo.Users"));
    }
}
