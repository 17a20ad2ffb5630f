use serde::{Deserialize, Serialize};

/// Newtype to avoid confusion between schema names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaName(pub String);

/// Newtype for table names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName(pub String);

/// Which of the two compared databases a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// A schema-object category that can be switched on or off by the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Tables,
    Fields,
    PrimaryKeys,
    ForeignKeys,
    Indexes,
    Constraints,
    Triggers,
    StoredProcedures,
    DatabaseEncoding,
}

impl Category {
    /// The six per-table categories, in report order.
    pub const TABLE_OBJECTS: [Category; 6] = [
        Category::Fields,
        Category::PrimaryKeys,
        Category::ForeignKeys,
        Category::Indexes,
        Category::Constraints,
        Category::Triggers,
    ];

    /// Field that identifies one object of this category inside a table,
    /// or `None` for categories that are not keyed collections.
    pub fn key_field(self) -> Option<&'static str> {
        match self {
            Category::Fields | Category::PrimaryKeys => Some("column_name"),
            Category::ForeignKeys | Category::Constraints => Some("constraint_name"),
            Category::Indexes => Some("index_name"),
            Category::Triggers => Some("trigger_name"),
            Category::StoredProcedures => Some("procedure_name"),
            Category::Tables | Category::DatabaseEncoding => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tables => "tables",
            Category::Fields => "columns",
            Category::PrimaryKeys => "primary keys",
            Category::ForeignKeys => "foreign keys",
            Category::Indexes => "indexes",
            Category::Constraints => "constraints",
            Category::Triggers => "triggers",
            Category::StoredProcedures => "stored procedures",
            Category::DatabaseEncoding => "database encoding",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_fields_follow_catalog_naming() {
        assert_eq!(Category::Fields.key_field(), Some("column_name"));
        assert_eq!(Category::PrimaryKeys.key_field(), Some("column_name"));
        assert_eq!(Category::ForeignKeys.key_field(), Some("constraint_name"));
        assert_eq!(Category::Indexes.key_field(), Some("index_name"));
        assert_eq!(Category::Constraints.key_field(), Some("constraint_name"));
        assert_eq!(Category::Triggers.key_field(), Some("trigger_name"));
        assert_eq!(Category::StoredProcedures.key_field(), Some("procedure_name"));
        assert_eq!(Category::Tables.key_field(), None);
    }

    #[test]
    fn side_display() {
        assert_eq!(Side::A.to_string(), "A");
        assert_eq!(Side::B.to_string(), "B");
    }
}
