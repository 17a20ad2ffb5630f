//! Compare two in-memory snapshots without a database, and print the JSON
//! report.
//!
//! ```sh
//! cargo run --example compare_as_lib
//! ```

use schemadiff::domain::ports::OutputWriter;
use schemadiff::presentation::writers::writer_for;
use schemadiff::{compare, ComparisonReport, Record, ScopeSelector, SchemaSnapshot, Side, SideInfo, TableSnapshot};
use serde_json::json;

fn column(name: &str, data_type: &str, max_length: i64) -> Record {
    Record::from([
        ("column_name".to_string(), json!(name)),
        ("data_type".to_string(), json!(data_type)),
        ("max_length".to_string(), json!(max_length)),
    ])
}

fn main() -> anyhow::Result<()> {
    let mut users_a = TableSnapshot::new("dbo", "Users");
    users_a.columns = vec![column("id", "int", 4), column("email", "varchar", 100)];

    let mut users_b = TableSnapshot::new("dbo", "Users");
    users_b.columns = vec![
        column("id", "int", 4),
        column("email", "varchar", 255),
        column("created_at", "datetime", 8),
    ];

    let a = SchemaSnapshot {
        database_info: Record::from([("name".to_string(), json!("shop_staging"))]),
        tables: vec![users_a, TableSnapshot::new("dbo", "Legacy")],
        ..SchemaSnapshot::default()
    };
    let b = SchemaSnapshot {
        database_info: Record::from([("name".to_string(), json!("shop_prod"))]),
        tables: vec![users_b],
        ..SchemaSnapshot::default()
    };

    let scope = ScopeSelector {
        tables: true,
        fields: true,
        ..ScopeSelector::default()
    };
    let result = compare(&a, &b, &scope)?;
    let report = ComparisonReport::new(
        SideInfo::describe(Side::A, "snapshot", &a),
        SideInfo::describe(Side::B, "snapshot", &b),
        scope,
        result,
    );

    println!("{:#?}", report.summary);
    if let Some(writer) = writer_for("json") {
        println!("{}", writer.format(&report)?);
    }
    Ok(())
}
