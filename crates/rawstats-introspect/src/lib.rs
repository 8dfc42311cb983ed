//! Live schema introspection for rawstats.
//!
//! Each adapter answers one parameterized catalog query per table and
//! reports `column name -> column type` pairs through
//! [`rawstats_core::ColumnIntrospector`].

pub mod connect;
pub mod mysql;
pub mod options;
pub mod postgres;

pub use connect::{Engine, connect};
pub use mysql::MySqlIntrospector;
pub use options::PoolOptions;
pub use postgres::PostgresIntrospector;

pub use rawstats_core::{ColumnIntrospector, ColumnTypes};
