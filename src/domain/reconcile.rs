use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::domain::record::{compare_record, ObjectComparison, Record};

/// Where a reconciled object was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Presence {
    OnlyInA,
    OnlyInB,
    InBoth,
}

/// An unmatched object together with the side it was found on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tagged<O> {
    #[serde(flatten)]
    pub entity: O,
    pub status: Presence,
}

/// Three-way reconciliation of one keyed collection.
///
/// `O` is what gets reported for objects found on one side only, `M` is the
/// comparison produced for every matched pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonNode<O, M> {
    pub only_in_a: Vec<Tagged<O>>,
    pub only_in_b: Vec<Tagged<O>>,
    pub in_both: Vec<M>,
}

impl<O, M> Default for ComparisonNode<O, M> {
    fn default() -> Self {
        Self {
            only_in_a: Vec::new(),
            only_in_b: Vec::new(),
            in_both: Vec::new(),
        }
    }
}

impl<O, M> ComparisonNode<O, M> {
    /// `true` when some object exists on one side only.
    pub fn has_unmatched(&self) -> bool {
        !self.only_in_a.is_empty() || !self.only_in_b.is_empty()
    }
}

/// Node type for flat catalog records (columns, keys, indexes, procedures…).
pub type RecordNode = ComparisonNode<Record, ObjectComparison>;

impl RecordNode {
    /// `true` when any matched pair differs field-wise.
    pub fn has_changed_objects(&self) -> bool {
        self.in_both.iter().any(|c| c.has_differences)
    }
}

/// What to do with records whose key field is missing, null or empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeylessPolicy {
    /// Leave them out of every bucket.
    #[default]
    Drop,
    /// Key them by their canonical JSON, so identical keyless records match
    /// and all others show up as present on one side only.
    Synthesize,
}

// ─── Key index ────────────────────────────────────────────────────────────────

/// Key → item lookup that remembers the order in which keys were first seen.
/// A repeated key keeps its position but its item is replaced by the later one.
struct KeyIndex<'a, T> {
    order: Vec<String>,
    items: HashMap<String, &'a T>,
}

impl<'a, T> KeyIndex<'a, T> {
    fn build(items: &'a [T], key_of: &impl Fn(&T) -> Option<String>) -> Self {
        let mut index = KeyIndex {
            order: Vec::with_capacity(items.len()),
            items: HashMap::with_capacity(items.len()),
        };
        for item in items {
            let Some(key) = key_of(item) else {
                continue;
            };
            if index.items.insert(key.clone(), item).is_none() {
                index.order.push(key);
            }
        }
        index
    }

    fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &'a T)> + '_ {
        self.order
            .iter()
            .map(move |k| (k.as_str(), self.items[k.as_str()]))
    }
}

// ─── Reconciliation ───────────────────────────────────────────────────────────

/// Generic three-way set reconciliation.
///
/// Items whose key is `None` take part in nothing. `summarize` builds what is
/// reported for unmatched items; `pair` compares a matched pair. Output order
/// follows first-seen key order: A's for `only_in_a` and `in_both`, B's for
/// `only_in_b`. Inputs are never re-sorted.
pub fn reconcile<T, O, M>(
    a: &[T],
    b: &[T],
    key_of: impl Fn(&T) -> Option<String>,
    summarize: impl Fn(&T) -> O,
    mut pair: impl FnMut(&T, &T) -> M,
) -> ComparisonNode<O, M> {
    let index_a = KeyIndex::build(a, &key_of);
    let index_b = KeyIndex::build(b, &key_of);

    let mut node = ComparisonNode::default();

    for (key, item) in index_a.iter() {
        if !index_b.contains(key) {
            node.only_in_a.push(Tagged {
                entity: summarize(item),
                status: Presence::OnlyInA,
            });
        }
    }

    for (key, item) in index_b.iter() {
        if !index_a.contains(key) {
            node.only_in_b.push(Tagged {
                entity: summarize(item),
                status: Presence::OnlyInB,
            });
        }
    }

    for (key, item_a) in index_a.iter() {
        if let Some(&item_b) = index_b.items.get(key) {
            node.in_both.push(pair(item_a, item_b));
        }
    }

    node
}

/// Reconcile two record lists on `key_field`, dropping keyless records.
pub fn compare_objects(a: &[Record], b: &[Record], key_field: &str) -> RecordNode {
    compare_objects_with(a, b, key_field, KeylessPolicy::Drop)
}

/// Reconcile two record lists on `key_field` with an explicit keyless policy.
pub fn compare_objects_with(
    a: &[Record],
    b: &[Record],
    key_field: &str,
    policy: KeylessPolicy,
) -> RecordNode {
    let keyless = a
        .iter()
        .chain(b)
        .filter(|r| record_key(r, key_field).is_none())
        .count();
    if keyless > 0 {
        debug!(key_field, keyless, ?policy, "records without a key");
    }

    reconcile(
        a,
        b,
        |r| match policy {
            KeylessPolicy::Drop => record_key(r, key_field),
            KeylessPolicy::Synthesize => {
                record_key(r, key_field).or_else(|| Some(synthesized_key(r)))
            }
        },
        Record::clone,
        compare_record,
    )
}

/// The identifying value of a record: a non-empty string, or a number.
/// Null, missing, empty, boolean and nested values yield no key.
///
/// Keys are tagged with their JSON type, so the number `1` and the string
/// `"1"` never match each other.
pub fn record_key(record: &Record, key_field: &str) -> Option<String> {
    match record.get(key_field)? {
        Value::String(s) if !s.is_empty() => Some(format!("s:{s}")),
        Value::Number(n) => Some(format!("n:{n}")),
        _ => None,
    }
}

fn synthesized_key(record: &Record) -> String {
    // Record is a BTreeMap, so its JSON is canonical.
    format!("#{}", serde_json::to_string(record).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn column(name: &str, data_type: &str) -> Record {
        record(&[("column_name", json!(name)), ("data_type", json!(data_type))])
    }

    #[test]
    fn splits_into_three_buckets() {
        let a = vec![column("id", "int"), column("name", "varchar"), column("legacy", "bit")];
        let b = vec![column("id", "int"), column("name", "nvarchar"), column("created", "date")];

        let node = compare_objects(&a, &b, "column_name");

        assert_eq!(node.only_in_a.len(), 1);
        assert_eq!(node.only_in_a[0].entity["column_name"], json!("legacy"));
        assert_eq!(node.only_in_a[0].status, Presence::OnlyInA);

        assert_eq!(node.only_in_b.len(), 1);
        assert_eq!(node.only_in_b[0].entity["column_name"], json!("created"));
        assert_eq!(node.only_in_b[0].status, Presence::OnlyInB);

        assert_eq!(node.in_both.len(), 2);
        assert!(!node.in_both[0].has_differences);
        assert!(node.in_both[1].has_differences);
        assert!(node.has_changed_objects());
        assert!(node.has_unmatched());
    }

    #[test]
    fn preserves_input_order() {
        let a = vec![column("z", "int"), column("a", "int"), column("m", "int")];
        let b = vec![column("m", "int"), column("z", "int"), column("q", "int"), column("b", "int")];

        let node = compare_objects(&a, &b, "column_name");

        let both: Vec<String> = node.in_both.iter().map(|c| c.label("column_name")).collect();
        assert_eq!(both, vec!["z", "m"]);
        let only_b: Vec<&Value> = node.only_in_b.iter().map(|t| &t.entity["column_name"]).collect();
        assert_eq!(only_b, vec![&json!("q"), &json!("b")]);
    }

    #[test]
    fn duplicate_key_keeps_first_position_and_last_record() {
        let a = vec![column("id", "int"), column("name", "text"), column("id", "bigint")];
        let b = vec![column("name", "text"), column("id", "bigint")];

        let node = compare_objects(&a, &b, "column_name");

        assert_eq!(node.in_both.len(), 2);
        assert_eq!(node.in_both[0].label("column_name"), "id");
        assert!(!node.in_both[0].has_differences);
        assert_eq!(node.in_both[0].details_a["data_type"], json!("bigint"));
    }

    #[test]
    fn keyless_records_are_dropped_by_default() {
        let a = vec![
            record(&[("constraint_name", Value::Null), ("type_desc", json!("CHECK"))]),
            record(&[("type_desc", json!("DEFAULT"))]),
            record(&[("constraint_name", json!("")), ("type_desc", json!("CHECK"))]),
        ];
        let node = compare_objects(&a, &[], "constraint_name");
        assert!(node.only_in_a.is_empty());
        assert!(node.only_in_b.is_empty());
        assert!(node.in_both.is_empty());
    }

    #[test]
    fn keyless_records_can_be_synthesized() {
        let shared = record(&[("type_desc", json!("DEFAULT")), ("definition", json!("(0)"))]);
        let only_a = record(&[("type_desc", json!("CHECK")), ("definition", json!("(x > 0)"))]);
        let a = vec![shared.clone(), only_a];
        let b = vec![shared];

        let node = compare_objects_with(&a, &b, "constraint_name", KeylessPolicy::Synthesize);

        assert_eq!(node.in_both.len(), 1);
        assert!(!node.in_both[0].has_differences);
        assert_eq!(node.only_in_a.len(), 1);
        assert_eq!(node.only_in_a[0].entity["type_desc"], json!("CHECK"));
    }

    #[test]
    fn numeric_keys_are_accepted() {
        let a = vec![record(&[("column_id", json!(1))])];
        let node = compare_objects(&a, &a, "column_id");
        assert_eq!(node.in_both.len(), 1);
    }

    #[test]
    fn numeric_and_text_keys_do_not_match() {
        let a = vec![record(&[("column_id", json!(1))])];
        let b = vec![record(&[("column_id", json!("1"))])];
        let node = compare_objects(&a, &b, "column_id");
        assert!(node.in_both.is_empty());
        assert_eq!(node.only_in_a.len(), 1);
        assert_eq!(node.only_in_b.len(), 1);
        assert_eq!(record_key(&a[0], "column_id").as_deref(), Some("n:1"));
        assert_eq!(record_key(&b[0], "column_id").as_deref(), Some("s:1"));
    }

    #[test]
    fn empty_inputs_give_empty_node() {
        let node = compare_objects(&[], &[], "column_name");
        assert_eq!(node, RecordNode::default());
    }

    #[test]
    fn swapping_sides_swaps_buckets_and_values() {
        let a = vec![column("id", "int"), column("old", "int")];
        let b = vec![column("id", "bigint"), column("new", "int")];

        let ab = compare_objects(&a, &b, "column_name");
        let ba = compare_objects(&b, &a, "column_name");

        assert_eq!(ab.only_in_a[0].entity, ba.only_in_b[0].entity);
        assert_eq!(ab.only_in_b[0].entity, ba.only_in_a[0].entity);
        let d_ab = &ab.in_both[0].differences[0];
        let d_ba = &ba.in_both[0].differences[0];
        assert_eq!(d_ab.value_a, d_ba.value_b);
        assert_eq!(d_ab.value_b, d_ba.value_a);
    }

    #[test]
    fn tagged_entity_is_flattened() {
        let node = compare_objects(&[column("id", "int")], &[], "column_name");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["onlyInA"][0]["column_name"], "id");
        assert_eq!(json["onlyInA"][0]["status"], "onlyInA");
        assert_eq!(json["onlyInB"], json!([]));
        assert_eq!(json["inBoth"], json!([]));
    }

    #[test]
    fn generic_over_non_record_items() {
        let a = vec![("x", 1), ("y", 2)];
        let b = vec![("y", 3)];
        let node = reconcile(
            &a,
            &b,
            |(k, _)| Some(k.to_string()),
            |(k, _)| k.to_string(),
            |(_, va), (_, vb)| va == vb,
        );
        assert_eq!(node.only_in_a[0].entity, "x");
        assert_eq!(node.in_both, vec![false]);
    }
}
