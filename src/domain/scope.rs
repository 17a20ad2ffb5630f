use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Category;

/// Selects which schema-object categories one comparison run includes.
///
/// JSON payloads use camelCase keys (`primaryKeys`); TOML config files may use
/// the snake_case aliases (`primary_keys`). Every flag defaults to `false`, and
/// `all = true` switches every category on regardless of the individual flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeSelector {
    pub tables: bool,
    pub fields: bool,
    #[serde(alias = "primary_keys")]
    pub primary_keys: bool,
    #[serde(alias = "foreign_keys")]
    pub foreign_keys: bool,
    pub indexes: bool,
    pub constraints: bool,
    pub triggers: bool,
    #[serde(alias = "stored_procedures")]
    pub stored_procedures: bool,
    #[serde(alias = "database_encoding")]
    pub database_encoding: bool,
    pub all: bool,
}

impl ScopeSelector {
    /// Scope with every category switched on.
    pub fn everything() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    /// Returns `true` if `category` takes part in the comparison.
    pub fn includes(&self, category: Category) -> bool {
        if self.all {
            return true;
        }
        match category {
            Category::Tables => self.tables,
            Category::Fields => self.fields,
            Category::PrimaryKeys => self.primary_keys,
            Category::ForeignKeys => self.foreign_keys,
            Category::Indexes => self.indexes,
            Category::Constraints => self.constraints,
            Category::Triggers => self.triggers,
            Category::StoredProcedures => self.stored_procedures,
            Category::DatabaseEncoding => self.database_encoding,
        }
    }

    /// Returns `true` if at least one per-table category is selected.
    pub fn includes_table_objects(&self) -> bool {
        Category::TABLE_OBJECTS.iter().any(|c| self.includes(*c))
    }
}
