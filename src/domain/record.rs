use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::reconcile::Presence;

/// A flat catalog record: attribute name → scalar value, sorted by name.
pub type Record = BTreeMap<String, Value>;

/// Field names produced by the comparator itself. They are never compared, so
/// a comparison result fed back in as a record cannot contaminate the diff.
pub const RESERVED_FIELDS: [&str; 6] = [
    "status",
    "hasDifferences",
    "differences",
    "similarities",
    "detailsA",
    "detailsB",
];

/// One field whose value differs between A and B.
///
/// `None` means the field is absent on that side, which is distinct from a
/// present `null`. Absent values are omitted from the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDifference {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_a: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_b: Option<Value>,
}

/// One field whose value is identical on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSimilarity {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Field-level comparison of one matched pair of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectComparison {
    pub status: Presence,
    pub has_differences: bool,
    pub differences: Vec<FieldDifference>,
    pub similarities: Vec<FieldSimilarity>,
    pub details_a: Record,
    pub details_b: Record,
}

impl ObjectComparison {
    /// Value of `field` on the A side (falling back to B), as display text.
    pub fn label(&self, field: &str) -> String {
        self.details_a
            .get(field)
            .or_else(|| self.details_b.get(field))
            .map(display_value)
            .unwrap_or_default()
    }
}

/// Compare two records field by field.
///
/// The union of field names from both records is walked in sorted order.
/// Values are compared with strict equality: `1` and `"1"` differ, and so do a
/// missing field and a `null` one. Both source records are kept verbatim.
pub fn compare_record(a: &Record, b: &Record) -> ObjectComparison {
    let fields: BTreeSet<&String> = a
        .keys()
        .chain(b.keys())
        .filter(|k| !RESERVED_FIELDS.contains(&k.as_str()))
        .collect();

    let mut differences = Vec::new();
    let mut similarities = Vec::new();

    for field in fields {
        let value_a = a.get(field);
        let value_b = b.get(field);
        if value_a == value_b {
            similarities.push(FieldSimilarity {
                field: field.clone(),
                value: value_a.cloned(),
            });
        } else {
            differences.push(FieldDifference {
                field: field.clone(),
                value_a: value_a.cloned(),
                value_b: value_b.cloned(),
            });
        }
    }

    ObjectComparison {
        status: Presence::InBoth,
        has_differences: !differences.is_empty(),
        differences,
        similarities,
        details_a: a.clone(),
        details_b: b.clone(),
    }
}

/// Render a scalar for humans: strings without quotes, everything else as JSON.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
