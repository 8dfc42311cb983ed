use thiserror::Error;

/// Core error type shared across rawstats crates.
///
/// Errors are cloneable so a failed configuration load can be memoized and
/// reported to every caller of the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested realm is not present in the configuration.
    #[error("raw statistics configuration not found for realm \"{realm}\"")]
    RealmNotFound { realm: String },
    /// The realm has no `tables` section at all.
    #[error("table definitions not found for realm \"{realm}\"")]
    TablesNotFound { realm: String },
    /// The realm has no `fields` section at all.
    #[error("field definitions not found for realm \"{realm}\"")]
    FieldsNotFound { realm: String },
    /// A field declares a `batchExport` value other than `true`, `false` or `"anonymize"`.
    #[error("unknown \"batchExport\" option {value} for field \"{field}\" in realm \"{realm}\"")]
    InvalidExportPolicy {
        realm: String,
        field: String,
        value: String,
    },
    /// A table-backed field references a column missing from the live schema.
    #[error(
        "column \"{table_alias}.{column}\" for field \"{field}\" in realm \"{realm}\" not found in database schema"
    )]
    UnresolvedColumn {
        realm: String,
        field: String,
        table_alias: String,
        column: String,
    },
    /// The schema catalog query could not be executed.
    #[error("introspection failed: {0}")]
    IntrospectionConnection(String),
    /// The schema catalog query did not complete in time.
    #[error("introspection of {schema}.{table} timed out after {timeout_ms}ms")]
    IntrospectionTimeout {
        schema: String,
        table: String,
        timeout_ms: u64,
    },
    /// The database URL names an engine without an introspector.
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    /// The configuration document is malformed or internally inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for results returned by rawstats crates.
pub type Result<T> = std::result::Result<T, Error>;
