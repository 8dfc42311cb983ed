use std::collections::BTreeSet;

use crate::config::{FieldSource, RawStatisticsConfig, RealmConfig};
use crate::error::{Error, Result};

/// Validate internal consistency of a raw statistics document.
///
/// This checks, per realm:
/// - table aliases are unique
/// - join targets reference a table of the same realm
/// - every field has exactly one source (table column or formula)
/// - table-backed fields reference a declared table alias
/// - `batchExport` values are recognized on fields that are not internal
/// - exported formula fields declare a `type`
pub fn validate_config(config: &RawStatisticsConfig) -> Result<()> {
    for realm in config.realms.values() {
        validate_realm(realm)?;
    }
    Ok(())
}

fn validate_realm(realm: &RealmConfig) -> Result<()> {
    let mut aliases = BTreeSet::new();
    for table in realm.tables.iter().flatten() {
        if !aliases.insert(table.alias.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "duplicate table alias \"{}\" in realm \"{}\"",
                table.alias, realm.name
            )));
        }
    }

    for table in realm.tables.iter().flatten() {
        if let Some(join) = &table.join {
            if !aliases.contains(join.foreign_table_alias.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "table \"{}\" in realm \"{}\" joins unknown table alias \"{}\"",
                    table.alias, realm.name, join.foreign_table_alias
                )));
            }
        }
    }

    for field in realm.fields.iter().flatten() {
        let exported = !field.is_internal() && field.export_policy(&realm.name)?.is_exported();

        match field.source() {
            Some(FieldSource::Column { table_alias, .. }) => {
                if !aliases.contains(table_alias) {
                    return Err(Error::InvalidConfig(format!(
                        "field \"{}\" in realm \"{}\" references unknown table alias \"{}\"",
                        field.name, realm.name, table_alias
                    )));
                }
            }
            Some(FieldSource::Formula { field_type, .. }) => {
                if field_type.is_none() && exported {
                    return Err(Error::InvalidConfig(format!(
                        "exported formula field \"{}\" in realm \"{}\" has no type",
                        field.name, realm.name
                    )));
                }
            }
            None => {
                return Err(Error::InvalidConfig(format!(
                    "field \"{}\" in realm \"{}\" must declare either tableAlias and column or a formula",
                    field.name, realm.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> RawStatisticsConfig {
        RawStatisticsConfig::from_value(value).expect("parse config")
    }

    #[test]
    fn accepts_consistent_realm() {
        let config = parse(json!({
            "realms": {
                "jobs": {
                    "tables": [
                        { "alias": "jt", "name": "job_tasks", "schema": "modw" },
                        {
                            "alias": "r", "name": "resourcefact", "schema": "modw",
                            "join": { "primaryKey": "id", "foreignTableAlias": "jt", "foreignKey": "resource_id" }
                        }
                    ],
                    "fields": [
                        { "name": "cpu_time", "tableAlias": "jt", "column": "cpu_time", "batchExport": true },
                        { "name": "ratio", "formula": "a / b", "type": "double", "batchExport": "anonymize" },
                        { "name": "scratch", "formula": "1", "dtype": "ignore", "batchExport": true }
                    ]
                }
            }
        }));

        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn rejects_duplicate_table_alias() {
        let config = parse(json!({
            "realms": { "jobs": { "tables": [
                { "alias": "jt", "name": "a", "schema": "modw" },
                { "alias": "jt", "name": "b", "schema": "modw" }
            ] } }
        }));

        let err = validate_config(&config).expect_err("duplicate alias");
        assert!(err.to_string().contains("duplicate table alias \"jt\""));
    }

    #[test]
    fn rejects_dangling_table_alias() {
        let config = parse(json!({
            "realms": { "jobs": {
                "tables": [{ "alias": "jt", "name": "job_tasks", "schema": "modw" }],
                "fields": [{ "name": "user", "tableAlias": "p", "column": "person_id" }]
            } }
        }));

        let err = validate_config(&config).expect_err("dangling alias");
        assert!(err.to_string().contains("unknown table alias \"p\""));
    }

    #[test]
    fn rejects_dangling_join() {
        let config = parse(json!({
            "realms": { "jobs": { "tables": [{
                "alias": "jt", "name": "job_tasks", "schema": "modw",
                "join": { "primaryKey": "id", "foreignTableAlias": "missing", "foreignKey": "id" }
            }] } }
        }));

        assert!(matches!(validate_config(&config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_field_with_two_sources() {
        let config = parse(json!({
            "realms": { "jobs": {
                "tables": [{ "alias": "jt", "name": "job_tasks", "schema": "modw" }],
                "fields": [{ "name": "x", "tableAlias": "jt", "column": "x", "formula": "y" }]
            } }
        }));

        let err = validate_config(&config).expect_err("two sources");
        assert!(err.to_string().contains("either tableAlias and column or a formula"));
    }

    #[test]
    fn rejects_exported_formula_without_type() {
        let config = parse(json!({
            "realms": { "jobs": {
                "fields": [{ "name": "x", "formula": "1 + 1", "batchExport": true }]
            } }
        }));

        assert!(matches!(validate_config(&config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_unknown_export_policy() {
        let config = parse(json!({
            "realms": { "jobs": {
                "fields": [{ "name": "x", "formula": "1", "type": "int", "batchExport": "yes" }]
            } }
        }));

        assert_eq!(
            validate_config(&config),
            Err(Error::InvalidExportPolicy {
                realm: "jobs".to_string(),
                field: "x".to_string(),
                value: "\"yes\"".to_string(),
            })
        );
    }
}
