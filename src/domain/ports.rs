use crate::domain::{
    comparison::ComparisonResult,
    error::CompareError,
    record::Record,
    report::ComparisonReport,
    scope::ScopeSelector,
    snapshot::SchemaSnapshot,
    value_objects::{Category, SchemaName, TableName},
};
use anyhow::Result;
use async_trait::async_trait;

/// Port: read access to a database catalog (implemented by SqlxCatalogRepository)
///
/// Every method is a pure read returning flat records whose field names are
/// the ones the comparator keys on (`column_name`, `index_name`, …).
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Driver name ("postgres", "mysql", …), for report metadata only.
    fn driver(&self) -> &str;

    async fn database_info(&self) -> Result<Record>;

    /// One record per table with `schema_name` and `table_name`.
    async fn list_tables(&self) -> Result<Vec<Record>>;

    async fn table_objects(
        &self,
        category: Category,
        schema: &SchemaName,
        table: &TableName,
    ) -> Result<Vec<Record>>;

    async fn stored_procedures(&self) -> Result<Vec<Record>>;
}

/// Port: schema comparison algorithm (implemented by SchemaComparator)
pub trait SchemaDiffer: Send + Sync {
    fn diff(
        &self,
        a: &SchemaSnapshot,
        b: &SchemaSnapshot,
        scope: &ScopeSelector,
    ) -> std::result::Result<ComparisonResult, CompareError>;
}

/// Port: output formatting (implemented by JsonWriter, HtmlWriter)
pub trait OutputWriter: Send + Sync {
    /// Serializes the report to a string (JSON, HTML, etc.)
    fn format(&self, report: &ComparisonReport) -> Result<String>;
    /// Extension of the produced file (e.g. "json", "html")
    fn extension(&self) -> &'static str;
}
