//! Core contracts for rawstats.
//!
//! This crate defines the realm configuration model, placeholder
//! substitution, the realm configuration store, and the batch export catalog
//! builder. Database access is behind [`ColumnIntrospector`], implemented by
//! the `rawstats-introspect` crate.

pub mod catalog;
pub mod config;
pub mod error;
pub mod introspect;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod store;
pub mod validation;
pub mod variables;

pub use catalog::{DEFAULT_INTROSPECTION_TIMEOUT, ExportCatalogBuilder, ExportField, RealmCatalog};
pub use config::{
    ExportPolicy, FieldDef, FieldSource, RawStatisticsConfig, RealmConfig, TableDef, TableJoin,
};
pub use error::{Error, Result};
pub use introspect::{ColumnIntrospector, ColumnTypeIndex, ColumnTypes};
pub use resolver::{FieldResolver, resolve_field};
pub use schema::config_json_schema;
pub use source::{CONFIG_FILE_NAME, CONFIG_FRAGMENT_DIR, ConfigSource, JsonFileSource, StaticSource};
pub use store::RealmConfigStore;
pub use validation::validate_config;
pub use variables::{HostConstants, VariableStore};
