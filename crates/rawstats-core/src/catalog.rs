use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ExportPolicy, FieldDef, FieldSource};
use crate::error::{Error, Result};
use crate::introspect::{ColumnIntrospector, ColumnTypeIndex, ColumnTypes};
use crate::resolver::FieldResolver;
use crate::store::RealmConfigStore;
use crate::variables::VariableStore;

/// Default upper bound for a single schema introspection query.
pub const DEFAULT_INTROSPECTION_TIMEOUT: Duration = Duration::from_secs(30);

const TIMESTAMP_SUFFIX: &str = " (Timestamp)";
const DEIDENTIFIED_SUFFIX: &str = " (Deidentified)";

/// A field offered for batch export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportField {
    pub name: String,
    pub alias: String,
    pub display: String,
    pub anonymize: bool,
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// Batch export catalog of one realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmCatalog {
    pub realm: String,
    pub display: String,
    pub fields: Vec<ExportField>,
}

/// Builds batch export field catalogs from the realm configuration and,
/// optionally, the live database schema.
pub struct ExportCatalogBuilder<'a> {
    store: &'a RealmConfigStore,
    variables: &'a VariableStore,
    introspector: Option<&'a dyn ColumnIntrospector>,
    timeout: Duration,
}

impl<'a> ExportCatalogBuilder<'a> {
    pub fn new(store: &'a RealmConfigStore, variables: &'a VariableStore) -> Self {
        Self {
            store,
            variables,
            introspector: None,
            timeout: DEFAULT_INTROSPECTION_TIMEOUT,
        }
    }

    /// Use `introspector` to look up column data types.
    pub fn with_introspector(mut self, introspector: &'a dyn ColumnIntrospector) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Bound each introspection query by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the export catalog of `realm`.
    ///
    /// Data types require an introspector for table-backed fields.
    pub async fn build_export_catalog(
        &self,
        realm: &str,
        include_data_types: bool,
    ) -> Result<Vec<ExportField>> {
        let resolver = FieldResolver::new(self.store, self.variables);
        let mut exported = Vec::new();

        for field in resolver.resolve_fields(realm)? {
            if field.is_internal() {
                continue;
            }
            let policy = field.export_policy(realm)?;
            if !policy.is_exported() {
                continue;
            }
            exported.push((field, policy));
        }

        let column_types = if include_data_types && has_column_fields(&exported) {
            Some(self.column_type_index(realm).await?)
        } else {
            None
        };

        let catalog = exported
            .into_iter()
            .map(|(field, policy)| -> Result<ExportField> {
                let data_type = if include_data_types {
                    Some(data_type_of(realm, &field, column_types.as_ref())?)
                } else {
                    None
                };
                Ok(export_field(field, policy, data_type))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            event = "export_catalog_built",
            realm = %realm,
            fields = catalog.len(),
            include_data_types
        );

        Ok(catalog)
    }

    /// Build the export catalog of every batch-exportable realm, in
    /// declaration order.
    pub async fn build_all_export_catalogs(
        &self,
        include_data_types: bool,
    ) -> Result<Vec<RealmCatalog>> {
        let mut catalogs = Vec::new();
        for realm in self.store.get_batch_export_realms()? {
            let fields = self
                .build_export_catalog(&realm.name, include_data_types)
                .await?;
            catalogs.push(RealmCatalog {
                realm: realm.name.clone(),
                display: realm.display_name().to_string(),
                fields,
            });
        }
        Ok(catalogs)
    }

    /// Column types of every table declared by `realm`, keyed by alias.
    ///
    /// The introspector is queried once per distinct `(schema, table)` pair,
    /// however many aliases or fields refer to it.
    pub async fn column_type_index(&self, realm: &str) -> Result<ColumnTypeIndex> {
        let introspector = self.introspector.ok_or_else(|| {
            Error::IntrospectionConnection("no schema introspector configured".to_string())
        })?;

        let mut by_table: BTreeMap<(&str, &str), ColumnTypes> = BTreeMap::new();
        let mut index = ColumnTypeIndex::default();

        for table in self.store.get_tables(realm)? {
            let key = (table.schema.as_str(), table.name.as_str());
            let columns = match by_table.get(&key) {
                Some(columns) => columns.clone(),
                None => {
                    let columns = self
                        .introspect_table(introspector, &table.schema, &table.name)
                        .await?;
                    by_table.insert(key, columns.clone());
                    columns
                }
            };
            index.insert(table.alias.clone(), columns);
        }

        Ok(index)
    }

    async fn introspect_table(
        &self,
        introspector: &dyn ColumnIntrospector,
        schema: &str,
        table: &str,
    ) -> Result<ColumnTypes> {
        tracing::debug!(
            event = "introspection_started",
            engine = introspector.engine(),
            schema = %schema,
            table = %table
        );

        let columns = tokio::time::timeout(self.timeout, introspector.column_types(schema, table))
            .await
            .map_err(|_| Error::IntrospectionTimeout {
                schema: schema.to_string(),
                table: table.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        tracing::debug!(
            event = "introspection_finished",
            schema = %schema,
            table = %table,
            columns = columns.len()
        );

        Ok(columns)
    }
}

fn has_column_fields(fields: &[(FieldDef, ExportPolicy)]) -> bool {
    fields
        .iter()
        .any(|(field, _)| matches!(field.source(), Some(FieldSource::Column { .. })))
}

fn data_type_of(
    realm: &str,
    field: &FieldDef,
    column_types: Option<&ColumnTypeIndex>,
) -> Result<String> {
    let unresolved = |table_alias: &str, column: &str| Error::UnresolvedColumn {
        realm: realm.to_string(),
        field: field.name.clone(),
        table_alias: table_alias.to_string(),
        column: column.to_string(),
    };

    match field.source() {
        Some(FieldSource::Formula {
            field_type: Some(field_type),
            ..
        }) => Ok(field_type.to_string()),
        Some(FieldSource::Formula {
            field_type: None, ..
        }) => Err(Error::InvalidConfig(format!(
            "exported formula field \"{}\" in realm \"{realm}\" has no type",
            field.name
        ))),
        Some(FieldSource::Column {
            table_alias,
            column,
        }) => column_types
            .and_then(|index| index.column_type(table_alias, column))
            .map(str::to_string)
            .ok_or_else(|| unresolved(table_alias, column)),
        None => Err(Error::InvalidConfig(format!(
            "field \"{}\" in realm \"{realm}\" needs either tableAlias and column or formula",
            field.name
        ))),
    }
}

fn export_field(field: FieldDef, policy: ExportPolicy, data_type: Option<String>) -> ExportField {
    let anonymize = policy == ExportPolicy::Anonymize;

    let mut display = field.name.clone();
    if field.is_timestamp() {
        display.push_str(TIMESTAMP_SUFFIX);
    }
    if anonymize {
        display.push_str(DEIDENTIFIED_SUFFIX);
    }

    ExportField {
        alias: field.alias.unwrap_or_else(|| field.name.clone()),
        name: field.name,
        display,
        anonymize,
        documentation: field.documentation,
        data_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_without_source_is_a_config_error() {
        let field = FieldDef {
            name: "Orphan".to_string(),
            table_alias: Some("jt".to_string()),
            batch_export: Some(serde_json::Value::Bool(true)),
            ..FieldDef::default()
        };

        let err = data_type_of("jobs", &field, None).expect_err("no source");
        assert!(matches!(
            err,
            Error::InvalidConfig(message)
                if message.contains("\"Orphan\"") && message.contains("\"jobs\"")
        ));
    }

    #[test]
    fn labels_anonymized_timestamps_in_order() {
        let field = FieldDef {
            name: "Start Time".to_string(),
            units: Some("ts".to_string()),
            ..FieldDef::default()
        };

        let exported = export_field(field, ExportPolicy::Anonymize, None);
        assert_eq!(exported.display, "Start Time (Timestamp) (Deidentified)");
        assert_eq!(exported.alias, "Start Time");
        assert!(exported.anonymize);
    }
}
