use std::fmt;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Top-level `rawstatistics` document.
///
/// Realms keep the order in which they were declared in the source files.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct RawStatisticsConfig {
    /// Realm configurations keyed by realm name.
    #[serde(default)]
    pub realms: IndexMap<String, RealmConfig>,
}

impl<'de> Deserialize<'de> for RawStatisticsConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Document {
            #[serde(default, deserialize_with = "unique_realms")]
            realms: IndexMap<String, RealmConfig>,
        }

        let Document { realms } = Document::deserialize(deserializer)?;
        Ok(Self { realms })
    }
}

/// Realm map in declaration order; a realm key may appear only once.
fn unique_realms<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, RealmConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RealmsVisitor;

    impl<'de> Visitor<'de> for RealmsVisitor {
        type Value = IndexMap<String, RealmConfig>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map of realm names to realm configurations")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut realms = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, mut realm)) = map.next_entry::<String, RealmConfig>()? {
                if realms.contains_key(&name) {
                    return Err(de::Error::custom(format!(
                        "realm \"{name}\" is declared more than once"
                    )));
                }
                realm.name = name.clone();
                realms.insert(name, realm);
            }
            Ok(realms)
        }
    }

    deserializer.deserialize_map(RealmsVisitor)
}

impl RawStatisticsConfig {
    /// Parse a document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| Error::InvalidConfig(err.to_string()))
    }

    /// Parse a document from an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| Error::InvalidConfig(err.to_string()))
    }

    /// Look up a realm by name.
    pub fn realm(&self, name: &str) -> Option<&RealmConfig> {
        self.realms.get(name)
    }

    /// Append the realms of another document.
    ///
    /// A realm may only be declared once across all merged documents.
    pub fn merge(&mut self, other: RawStatisticsConfig, origin: &str) -> Result<()> {
        for (name, realm) in other.realms {
            if self.realms.contains_key(&name) {
                return Err(Error::InvalidConfig(format!(
                    "realm \"{name}\" in {origin} is already defined"
                )));
            }
            self.realms.insert(name, realm);
        }
        Ok(())
    }
}

/// Raw statistics configuration for a single realm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RealmConfig {
    /// Realm name, copied from the document key.
    #[serde(skip)]
    pub name: String,
    /// Human-readable realm label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Whether the realm supports "show raw data". Absent means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<bool>,
    /// Whether the realm supports batch export. Absent means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDef>>,
}

impl RealmConfig {
    pub fn raw_data_enabled(&self) -> bool {
        self.raw_data != Some(false)
    }

    pub fn batch_export_enabled(&self) -> bool {
        self.export_enabled != Some(false)
    }

    /// Label used when presenting the realm, falling back to its name.
    pub fn display_name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.name)
    }
}

/// A database table referenced by a realm's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableDef {
    /// Short name used by fields to reference this table.
    pub alias: String,
    /// Table name in the database.
    pub name: String,
    /// Schema (database) containing the table.
    pub schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<TableJoin>,
}

/// Join of a table onto another table of the same realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableJoin {
    pub primary_key: String,
    pub foreign_table_alias: String,
    pub foreign_key: String,
}

/// Field definition as declared in the configuration.
///
/// Attributes that the engine does not interpret are kept in `extra` and
/// passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// `true`, `false` or `"anonymize"`; kept raw so that invalid values can be reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_export: Option<Value>,
    /// Declared data type of a formula-backed field.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDef {
    /// Where the field's value comes from, if declared consistently.
    pub fn source(&self) -> Option<FieldSource<'_>> {
        match (&self.table_alias, &self.column, &self.formula) {
            (Some(table_alias), Some(column), None) => Some(FieldSource::Column {
                table_alias,
                column,
            }),
            (None, None, Some(formula)) => Some(FieldSource::Formula {
                formula,
                field_type: self.field_type.as_deref(),
            }),
            _ => None,
        }
    }

    /// Interpret `batchExport` for this field.
    pub fn export_policy(&self, realm: &str) -> Result<ExportPolicy> {
        ExportPolicy::from_value(self.batch_export.as_ref()).map_err(|value| {
            Error::InvalidExportPolicy {
                realm: realm.to_string(),
                field: self.name.clone(),
                value,
            }
        })
    }

    /// Fields with these `dtype` values are never exported.
    pub fn is_internal(&self) -> bool {
        matches!(self.dtype.as_deref(), Some("ignore") | Some("analysis"))
    }

    pub fn is_timestamp(&self) -> bool {
        self.units.as_deref() == Some("ts")
    }
}

/// The single source of truth for a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource<'a> {
    Column {
        table_alias: &'a str,
        column: &'a str,
    },
    Formula {
        formula: &'a str,
        field_type: Option<&'a str>,
    },
}

/// Batch export policy of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPolicy {
    Disabled,
    Enabled,
    Anonymize,
}

impl ExportPolicy {
    /// Parse a raw `batchExport` value.
    ///
    /// Only exact `true`, `false` and `"anonymize"` are accepted; anything else
    /// is returned as its JSON rendering.
    pub fn from_value(value: Option<&Value>) -> std::result::Result<Self, String> {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(Self::Disabled),
            Some(Value::Bool(true)) => Ok(Self::Enabled),
            Some(Value::String(text)) if text == "anonymize" => Ok(Self::Anonymize),
            Some(other) => Err(other.to_string()),
        }
    }

    pub fn is_exported(self) -> bool {
        self != Self::Disabled
    }
}
