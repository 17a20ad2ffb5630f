use serde::{Deserialize, Serialize};

use crate::domain::error::CompareError;
use crate::domain::reconcile::{
    compare_objects_with, reconcile, ComparisonNode, KeylessPolicy, Presence, RecordNode,
};
use crate::domain::record::{FieldDifference, FieldSimilarity, Record};
use crate::domain::scope::ScopeSelector;
use crate::domain::snapshot::{SchemaSnapshot, TableIdentity, TableSnapshot};
use crate::domain::value_objects::{Category, Side};

/// Database-level attributes compared between A and B.
pub const DATABASE_INFO_FIELDS: [&str; 7] = [
    "name",
    "collation_name",
    "compatibility_level",
    "user_access_desc",
    "state_desc",
    "recovery_model_desc",
    "page_verify_option_desc",
];

/// Comparison of the singleton database-attribute records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInfoComparison {
    pub differences: Vec<FieldDifference>,
    pub similarities: Vec<FieldSimilarity>,
}

impl DatabaseInfoComparison {
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }
}

/// Comparison of one table present in both snapshots.
///
/// Each category is `None` when it was out of scope, which is different from
/// a computed but empty node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableComparison {
    pub schema_name: String,
    pub table_name: String,
    pub status: Presence,
    /// `true` if a matched column, key, index, constraint or trigger differs.
    pub has_differences: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<RecordNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_keys: Option<RecordNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_keys: Option<RecordNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexes: Option<RecordNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<RecordNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<RecordNode>,
}

impl TableComparison {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }

    pub fn category(&self, category: Category) -> Option<&RecordNode> {
        match category {
            Category::Fields => self.columns.as_ref(),
            Category::PrimaryKeys => self.primary_keys.as_ref(),
            Category::ForeignKeys => self.foreign_keys.as_ref(),
            Category::Indexes => self.indexes.as_ref(),
            Category::Constraints => self.constraints.as_ref(),
            Category::Triggers => self.triggers.as_ref(),
            _ => None,
        }
    }

    fn category_mut(&mut self, category: Category) -> Option<&mut Option<RecordNode>> {
        match category {
            Category::Fields => Some(&mut self.columns),
            Category::PrimaryKeys => Some(&mut self.primary_keys),
            Category::ForeignKeys => Some(&mut self.foreign_keys),
            Category::Indexes => Some(&mut self.indexes),
            Category::Constraints => Some(&mut self.constraints),
            Category::Triggers => Some(&mut self.triggers),
            _ => None,
        }
    }

    /// `true` when nothing differs at all, objects present on one side only
    /// included. `has_differences` only looks at matched objects.
    pub fn is_identical(&self) -> bool {
        !self.has_differences
            && Category::TABLE_OBJECTS
                .iter()
                .filter_map(|c| self.category(*c))
                .all(|node| !node.has_unmatched())
    }
}

pub type TableNode = ComparisonNode<TableIdentity, TableComparison>;

/// Aggregate result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub database_info: DatabaseInfoComparison,
    pub tables: TableNode,
    /// `None` when stored procedures were out of scope.
    pub stored_procedures: Option<RecordNode>,
}

// ─── Orchestration ────────────────────────────────────────────────────────────

/// Compare two snapshots, dropping records that have no key.
pub fn compare(
    a: &SchemaSnapshot,
    b: &SchemaSnapshot,
    scope: &ScopeSelector,
) -> Result<ComparisonResult, CompareError> {
    compare_with(a, b, scope, KeylessPolicy::Drop)
}

/// Compare two snapshots with an explicit policy for keyless records.
///
/// Fails only if a snapshot contains a table without a name. The function is
/// pure: the same inputs always give the same result.
pub fn compare_with(
    a: &SchemaSnapshot,
    b: &SchemaSnapshot,
    scope: &ScopeSelector,
    policy: KeylessPolicy,
) -> Result<ComparisonResult, CompareError> {
    validate_tables(a, Side::A)?;
    validate_tables(b, Side::B)?;

    let database_info = compare_database_info(&a.database_info, &b.database_info);

    let tables = reconcile(
        &a.tables,
        &b.tables,
        |t: &TableSnapshot| Some(t.qualified_name()),
        TableSnapshot::identity,
        |ta, tb| compare_table(ta, tb, scope, policy),
    );

    let stored_procedures = scope.includes(Category::StoredProcedures).then(|| {
        compare_objects_with(
            a.stored_procedures.as_deref().unwrap_or_default(),
            b.stored_procedures.as_deref().unwrap_or_default(),
            "procedure_name",
            policy,
        )
    });

    Ok(ComparisonResult {
        database_info,
        tables,
        stored_procedures,
    })
}

/// Compare one matched pair of tables, category by category.
///
/// Out-of-scope categories are left as `None` and are not computed.
pub fn compare_table(
    a: &TableSnapshot,
    b: &TableSnapshot,
    scope: &ScopeSelector,
    policy: KeylessPolicy,
) -> TableComparison {
    let mut result = TableComparison {
        schema_name: a.schema_name.clone(),
        table_name: a.table_name.clone(),
        status: Presence::InBoth,
        has_differences: false,
        columns: None,
        primary_keys: None,
        foreign_keys: None,
        indexes: None,
        constraints: None,
        triggers: None,
    };

    for category in Category::TABLE_OBJECTS {
        if !scope.includes(category) {
            continue;
        }
        let Some(key_field) = category.key_field() else {
            continue;
        };
        let node = compare_objects_with(a.objects(category), b.objects(category), key_field, policy);
        result.has_differences |= node.has_changed_objects();
        if let Some(slot) = result.category_mut(category) {
            *slot = Some(node);
        }
    }

    result
}

/// Compare the fixed set of database attributes. A field missing on both
/// sides counts as a similarity.
pub fn compare_database_info(a: &Record, b: &Record) -> DatabaseInfoComparison {
    let mut cmp = DatabaseInfoComparison::default();
    for field in DATABASE_INFO_FIELDS {
        let value_a = a.get(field);
        let value_b = b.get(field);
        if value_a == value_b {
            cmp.similarities.push(FieldSimilarity {
                field: field.to_string(),
                value: value_a.cloned(),
            });
        } else {
            cmp.differences.push(FieldDifference {
                field: field.to_string(),
                value_a: value_a.cloned(),
                value_b: value_b.cloned(),
            });
        }
    }
    cmp
}

fn validate_tables(snapshot: &SchemaSnapshot, side: Side) -> Result<(), CompareError> {
    for (index, table) in snapshot.tables.iter().enumerate() {
        if table.table_name.is_empty() {
            let reason = if table.schema_name.is_empty() {
                "missing schema and table name".to_string()
            } else {
                format!("missing table name in schema {}", table.schema_name)
            };
            return Err(CompareError::InvalidTable {
                side,
                index,
                reason,
            });
        }
    }
    Ok(())
}
