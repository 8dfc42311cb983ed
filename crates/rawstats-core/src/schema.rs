use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::config::RawStatisticsConfig;

/// Emit the JSON Schema for `rawstatistics.json`.
pub fn config_json_schema() -> RootSchema {
    schema_for!(RawStatisticsConfig)
}
