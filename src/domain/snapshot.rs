use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::CompareError;
use crate::domain::ports::CatalogRepository;
use crate::domain::record::Record;
use crate::domain::value_objects::{Category, SchemaName, TableName};

/// Point-in-time description of one database's structure.
///
/// Collections that are missing or `null` in serialised form load as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub database_info: Record,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<TableSnapshot>,
    /// Present only when stored procedures were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_procedures: Option<Vec<Record>>,
    /// Categories that could not be fetched and were replaced by an empty list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fetch_failures: Vec<FetchFailure>,
}

impl SchemaSnapshot {
    pub fn find_table(&self, schema: &SchemaName, table: &TableName) -> Option<&TableSnapshot> {
        self.tables
            .iter()
            .find(|t| t.schema_name == schema.0 && t.table_name == table.0)
    }
}

/// Structure of one table, identified by `(schema_name, table_name)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    #[serde(default)]
    pub schema_name: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<Record>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary_keys: Vec<Record>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub foreign_keys: Vec<Record>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indexes: Vec<Record>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub constraints: Vec<Record>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub triggers: Vec<Record>,
}

impl TableSnapshot {
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// `schema.table`, the key tables are matched on.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.table_name)
    }

    pub fn identity(&self) -> TableIdentity {
        TableIdentity {
            schema_name: self.schema_name.clone(),
            table_name: self.table_name.clone(),
        }
    }

    /// Records of one per-table category. Non-table categories have none.
    pub fn objects(&self, category: Category) -> &[Record] {
        match category {
            Category::Fields => &self.columns,
            Category::PrimaryKeys => &self.primary_keys,
            Category::ForeignKeys => &self.foreign_keys,
            Category::Indexes => &self.indexes,
            Category::Constraints => &self.constraints,
            Category::Triggers => &self.triggers,
            _ => &[],
        }
    }

    pub fn objects_mut(&mut self, category: Category) -> Option<&mut Vec<Record>> {
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
}

/// Identity of a table, which is all that is reported for a table found on
/// one side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableIdentity {
    pub schema_name: String,
    pub table_name: String,
}

impl std::fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.table_name)
    }
}

/// A catalog read that failed and was recovered as an empty collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub category: Category,
    pub object: String,
    pub message: String,
}

impl FetchFailure {
    pub fn to_error(&self) -> CompareError {
        CompareError::Fetch {
            category: self.category,
            object: self.object.clone(),
            message: self.message.clone(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─── In-memory catalog ────────────────────────────────────────────────────────

/// In-memory implementation of [`CatalogRepository`].
///
/// Serves a previously captured [`SchemaSnapshot`] (e.g. loaded from the JSON
/// written by `schemadiff snapshot`) as if it were a live database.
pub struct SnapshotCatalog {
    driver: String,
    snapshot: SchemaSnapshot,
}

impl SnapshotCatalog {
    pub fn new(driver: impl Into<String>, snapshot: SchemaSnapshot) -> Self {
        Self {
            driver: driver.into(),
            snapshot,
        }
    }
}

#[async_trait]
impl CatalogRepository for SnapshotCatalog {
    fn driver(&self) -> &str {
        &self.driver
    }

    async fn database_info(&self) -> Result<Record> {
        Ok(self.snapshot.database_info.clone())
    }

    async fn list_tables(&self) -> Result<Vec<Record>> {
        Ok(self
            .snapshot
            .tables
            .iter()
            .map(|t| {
                Record::from([
                    ("schema_name".to_string(), t.schema_name.clone().into()),
                    ("table_name".to_string(), t.table_name.clone().into()),
                ])
            })
            .collect())
    }

    async fn table_objects(
        &self,
        category: Category,
        schema: &SchemaName,
        table: &TableName,
    ) -> Result<Vec<Record>> {
        Ok(self
            .snapshot
            .find_table(schema, table)
            .map(|t| t.objects(category).to_vec())
            .unwrap_or_default())
    }

    async fn stored_procedures(&self) -> Result<Vec<Record>> {
        Ok(self.snapshot.stored_procedures.clone().unwrap_or_default())
    }
}
