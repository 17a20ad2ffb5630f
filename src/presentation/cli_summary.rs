use crate::domain::perf::PerfReport;
use crate::domain::comparison::TableComparison;
use crate::domain::reconcile::RecordNode;
use crate::domain::record::display_value;
use crate::domain::report::{ComparisonReport, Summary};
use crate::domain::value_objects::Category;
use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct FieldRow {
    field: String,
    a: String,
    b: String,
}

#[derive(Tabled)]
struct TableRow {
    table: String,
    status: String,
    columns: String,
    #[tabled(rename = "pk")]
    primary_keys: String,
    #[tabled(rename = "fk")]
    foreign_keys: String,
    indexes: String,
    constraints: String,
    triggers: String,
}

#[derive(Tabled)]
struct SummaryRow {
    metric: String,
    value: String,
}

/// `+a -b ~changed` for one category, or "-" when the category was not compared.
fn node_cell(node: Option<&RecordNode>) -> String {
    let Some(node) = node else {
        return "-".dimmed().to_string();
    };
    let changed = node.in_both.iter().filter(|c| c.has_differences).count();
    if !node.has_unmatched() && changed == 0 {
        return "=".green().to_string();
    }
    let mut parts = Vec::new();
    if !node.only_in_a.is_empty() {
        parts.push(format!("A+{}", node.only_in_a.len()).blue().to_string());
    }
    if !node.only_in_b.is_empty() {
        parts.push(format!("B+{}", node.only_in_b.len()).green().to_string());
    }
    if changed > 0 {
        parts.push(format!("~{changed}").yellow().to_string());
    }
    parts.join(" ")
}

fn table_row(t: &TableComparison) -> TableRow {
    let cell = |category| node_cell(t.category(category));
    TableRow {
        table: t.qualified_name().bold().to_string(),
        status: "differs".yellow().to_string(),
        columns: cell(Category::Fields),
        primary_keys: cell(Category::PrimaryKeys),
        foreign_keys: cell(Category::ForeignKeys),
        indexes: cell(Category::Indexes),
        constraints: cell(Category::Constraints),
        triggers: cell(Category::Triggers),
    }
}

fn presence_row(name: String, status: ColoredString) -> TableRow {
    let blank = || String::new();
    TableRow {
        table: name.bold().to_string(),
        status: status.to_string(),
        columns: blank(),
        primary_keys: blank(),
        foreign_keys: blank(),
        indexes: blank(),
        constraints: blank(),
        triggers: blank(),
    }
}

/// One-line verdict when nothing differs, `None` when the summary table follows.
fn verdict(s: &Summary) -> Option<String> {
    if s.has_differences() {
        return None;
    }
    if s.fetch_failures > 0 {
        let line = format!(
            "! No differences in what was read, but {} read(s) were incomplete.",
            s.fetch_failures
        );
        return Some(line.bold().yellow().to_string());
    }
    Some("✓ No structural differences.".bold().green().to_string())
}

pub fn print_summary(report: &ComparisonReport) {
    println!();

    println!("{}", "SCHEMADIFF SUMMARY".bold().cyan());
    println!(
        "{} ({}) ↔ {} ({})",
        report.a.database.blue(),
        report.a.driver,
        report.b.database.green(),
        report.b.driver
    );
    println!("Report: {}", report.report_id.bright_yellow());
    println!();

    let result = &report.comparison_result;

    // ── Database info ──
    if report.scope.includes(Category::DatabaseEncoding)
        && result.database_info.has_differences()
    {
        println!("{}", "DATABASE".bold());
        let rows: Vec<FieldRow> = result
            .database_info
            .differences
            .iter()
            .map(|d| FieldRow {
                field: d.field.clone(),
                a: d.value_a.as_ref().map(display_value).unwrap_or_default().blue().to_string(),
                b: d.value_b.as_ref().map(display_value).unwrap_or_default().green().to_string(),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
        println!();
    }

    // ── Tables ──
    let mut rows: Vec<TableRow> = Vec::new();
    rows.extend(
        result
            .tables
            .only_in_a
            .iter()
            .map(|t| presence_row(t.entity.to_string(), "only in A".blue())),
    );
    rows.extend(
        result
            .tables
            .only_in_b
            .iter()
            .map(|t| presence_row(t.entity.to_string(), "only in B".green())),
    );
    rows.extend(
        result
            .tables
            .in_both
            .iter()
            .filter(|t| !t.is_identical())
            .map(table_row),
    );

    if !rows.is_empty() {
        println!("{}", "TABLES".bold());
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..=7)).with(Alignment::right()))
            .to_string();
        println!("{table}");
        println!();
    }

    // ── Procedures ──
    if let Some(procs) = &result.stored_procedures {
        let changed: Vec<String> = procs
            .in_both
            .iter()
            .filter(|c| c.has_differences)
            .map(|c| c.label("procedure_name"))
            .collect();
        if procs.has_unmatched() || !changed.is_empty() {
            println!("{}", "STORED PROCEDURES".bold());
            for p in &procs.only_in_a {
                let name = p.entity.get("procedure_name").map(display_value).unwrap_or_default();
                println!("  {} {}", "A only".blue(), name);
            }
            for p in &procs.only_in_b {
                let name = p.entity.get("procedure_name").map(display_value).unwrap_or_default();
                println!("  {} {}", "B only".green(), name);
            }
            for name in changed {
                println!("  {} {}", "differs".yellow(), name);
            }
            println!();
        }
    }

    // ── Fetch failures ──
    let failures: Vec<_> = report
        .a
        .fetch_failures
        .iter()
        .map(|f| ("A", f))
        .chain(report.b.fetch_failures.iter().map(|f| ("B", f)))
        .collect();
    if !failures.is_empty() {
        println!("{}", "INCOMPLETE READS".bold().red());
        for (side, f) in failures {
            println!("  [{}] {}", side, f.to_error().to_string().red());
        }
        println!();
    }

    let s = &report.summary;
    if let Some(line) = verdict(s) {
        println!("{line}");
        println!();
        return;
    }

    let summary_rows = vec![
        SummaryRow {
            metric: "Database info differences".into(),
            value: s.database_info_differences.to_string().yellow().to_string(),
        },
        SummaryRow {
            metric: "Tables only in A".into(),
            value: s.tables_only_in_a.to_string().blue().to_string(),
        },
        SummaryRow {
            metric: "Tables only in B".into(),
            value: s.tables_only_in_b.to_string().green().to_string(),
        },
        SummaryRow {
            metric: "Tables with differences".into(),
            value: format!("{} / {}", s.tables_with_differences, s.tables_in_both)
                .yellow()
                .to_string(),
        },
        SummaryRow {
            metric: "Procedures only in A / B".into(),
            value: format!("{} / {}", s.procedures_only_in_a, s.procedures_only_in_b),
        },
        SummaryRow {
            metric: "Procedures with differences".into(),
            value: s.procedures_with_differences.to_string().yellow().to_string(),
        },
    ];

    let summary_table = Table::new(summary_rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..=1)).with(Alignment::right()))
        .to_string();

    println!("{summary_table}");
    println!();
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    operation: String,
    object: String,
    #[tabled(rename = "rows")]
    rows: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print a performance timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            operation: t.operation.dimmed().to_string(),
            object: t.object.bold().to_string(),
            rows: t.rows.to_string(),
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=3)).with(Alignment::right()))
        .to_string();

    println!("{table}");

    println!(
        "  Total: {} record(s) fetched  ·  {} ms elapsed",
        report.total_rows_fetched.to_string().bold(),
        format_duration(report.total_ms),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reconcile::compare_objects;
    use crate::domain::record::Record;
    use serde_json::json;

    fn named(name: &str, len: i64) -> Record {
        Record::from([
            ("column_name".to_string(), json!(name)),
            ("max_length".to_string(), json!(len)),
        ])
    }

    #[test]
    fn node_cell_describes_changes() {
        colored::control::set_override(false);

        assert_eq!(node_cell(None), "-");

        let same = compare_objects(&[named("id", 4)], &[named("id", 4)], "column_name");
        assert_eq!(node_cell(Some(&same)), "=");

        let mixed = compare_objects(
            &[named("id", 4), named("legacy", 1)],
            &[named("id", 8), named("new1", 1), named("new2", 1)],
            "column_name",
        );
        assert_eq!(node_cell(Some(&mixed)), "A+1 B+2 ~1");
    }

    #[test]
    fn verdict_mentions_incomplete_reads() {
        colored::control::set_override(false);

        let clean = Summary::default();
        assert_eq!(verdict(&clean).unwrap(), "✓ No structural differences.");

        let partial = Summary {
            fetch_failures: 2,
            ..Summary::default()
        };
        assert!(verdict(&partial).unwrap().contains("2 read(s) were incomplete"));

        let differs = Summary {
            tables_only_in_a: 1,
            fetch_failures: 2,
            ..Summary::default()
        };
        assert!(verdict(&differs).is_none());
    }

    #[test]
    fn durations_are_formatted() {
        colored::control::set_override(false);
        assert_eq!(format_duration(42), "42");
        assert_eq!(format_duration(1_500), "1.5s");
    }
}
