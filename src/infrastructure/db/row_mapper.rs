use anyhow::{Context, Result};
use serde_json::{json, Value};
use sqlx::any::AnyRow;
use sqlx::{Column, Row, TypeInfo};

use crate::domain::record::Record;

/// Convert a sqlx `AnyRow` into a `Record`, one entry per selected column.
pub fn row_to_record(row: &AnyRow) -> Result<Record> {
    let mut record = Record::new();
    for col in row.columns() {
        let value = decode_column(row, col.ordinal(), col.type_info().name())
            .with_context(|| format!("Failed to decode column {}", col.name()))?;
        record.insert(col.name().to_string(), value);
    }
    Ok(record)
}

/// Decode one column by the kind the any driver reports for it.
///
/// MySQL and MariaDB hand many information_schema strings back as BLOB;
/// those bytes are read as UTF-8 text.
fn decode_column(row: &AnyRow, idx: usize, kind: &str) -> Result<Value> {
    let v = match kind {
        // SQLite describes expression and literal columns as NULL even when
        // the value itself has a type.
        "NULL" => decode_untyped(row, idx)?,

        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(idx)?
            .map_or(Value::Null, Value::Bool),

        "SMALLINT" => row
            .try_get::<Option<i16>, _>(idx)?
            .map_or(Value::Null, |v| json!(v)),

        "INTEGER" => row
            .try_get::<Option<i32>, _>(idx)?
            .map_or(Value::Null, |v| json!(v)),

        "BIGINT" => row
            .try_get::<Option<i64>, _>(idx)?
            .map_or(Value::Null, |v| json!(v)),

        "REAL" => row
            .try_get::<Option<f32>, _>(idx)?
            .map_or(Value::Null, |v| json!(v as f64)),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(idx)?
            .map_or(Value::Null, |v| json!(v)),

        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(idx)?
            .map_or(Value::Null, |b| {
                Value::String(String::from_utf8_lossy(&b).into_owned())
            }),

        "TEXT" => row
            .try_get::<Option<String>, _>(idx)?
            .map_or(Value::Null, Value::String),

        _ => decode_untyped(row, idx)?,
    };
    Ok(v)
}

/// Decode a value whose column carries no usable type by trying each
/// representation the any driver can hold, narrowest first.
fn decode_untyped(row: &AnyRow, idx: usize) -> Result<Value> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(v.map_or(Value::Null, |v| json!(v)));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Ok(v.map_or(Value::Null, |v| json!(v)));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return Ok(v.map_or(Value::Null, Value::String));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return Ok(v.map_or(Value::Null, Value::Bool));
    }
    let bytes = row.try_get::<Option<Vec<u8>>, _>(idx)?;
    Ok(bytes.map_or(Value::Null, |b| {
        Value::String(String::from_utf8_lossy(&b).into_owned())
    }))
}
