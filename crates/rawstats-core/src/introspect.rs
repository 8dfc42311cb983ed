use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use crate::error::Result;

/// Column name to database type string (e.g. `decimal(18,2)`) for one table.
pub type ColumnTypes = HashMap<String, String>;

/// Trait implemented by database adapters that can report column types.
#[async_trait]
pub trait ColumnIntrospector: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Query the live catalog for the columns of `schema.table`.
    ///
    /// A table that does not exist yields an empty map.
    async fn column_types(&self, schema: &str, table: &str) -> Result<ColumnTypes>;
}

/// Column types of a realm's tables keyed by table alias.
///
/// Built per request and never cached, since the database schema can change
/// independently of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTypeIndex {
    tables: BTreeMap<String, ColumnTypes>,
}

impl ColumnTypeIndex {
    pub fn insert(&mut self, table_alias: impl Into<String>, columns: ColumnTypes) {
        self.tables.insert(table_alias.into(), columns);
    }

    pub fn table(&self, table_alias: &str) -> Option<&ColumnTypes> {
        self.tables.get(table_alias)
    }

    /// Type of `column` in the table registered as `table_alias`.
    pub fn column_type(&self, table_alias: &str, column: &str) -> Option<&str> {
        self.tables
            .get(table_alias)
            .and_then(|columns| columns.get(column))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
