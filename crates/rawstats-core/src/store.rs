use std::sync::OnceLock;

use crate::config::{FieldDef, RawStatisticsConfig, RealmConfig, TableDef};
use crate::error::{Error, Result};
use crate::source::{ConfigSource, StaticSource};
use crate::validation::validate_config;

/// Lazily loaded, validated view of the raw statistics configuration.
///
/// The document is read from its source on first access and kept for the
/// lifetime of the store. Concurrent first accesses share one load; a failed
/// load is remembered and returned to every caller.
pub struct RealmConfigStore {
    source: Box<dyn ConfigSource>,
    config: OnceLock<Result<RawStatisticsConfig>>,
}

impl std::fmt::Debug for RealmConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmConfigStore")
            .field("loaded", &self.config.get().is_some())
            .finish()
    }
}

impl RealmConfigStore {
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            config: OnceLock::new(),
        }
    }

    /// Store over an in-memory document. Validation still runs on first access.
    pub fn from_config(config: RawStatisticsConfig) -> Self {
        Self::new(StaticSource::new(config))
    }

    /// The validated document, loading it if needed.
    pub fn config(&self) -> Result<&RawStatisticsConfig> {
        self.config
            .get_or_init(|| {
                let config = self.source.load()?;
                validate_config(&config)?;
                tracing::debug!(event = "config_loaded", realms = config.realms.len());
                Ok(config)
            })
            .as_ref()
            .map_err(Error::clone)
    }

    /// Realm names in declaration order.
    pub fn realm_names(&self) -> Result<Vec<&str>> {
        Ok(self.config()?.realms.keys().map(String::as_str).collect())
    }

    pub fn has_realm(&self, realm: &str) -> Result<bool> {
        Ok(self.config()?.realm(realm).is_some())
    }

    pub fn get_realm(&self, realm: &str) -> Result<&RealmConfig> {
        self.config()?
            .realm(realm)
            .ok_or_else(|| Error::RealmNotFound {
                realm: realm.to_string(),
            })
    }

    /// Realms that support "show raw data", in declaration order.
    pub fn get_raw_data_realms(&self) -> Result<Vec<&RealmConfig>> {
        Ok(self
            .config()?
            .realms
            .values()
            .filter(|realm| realm.raw_data_enabled())
            .collect())
    }

    /// Realms that support batch export, in declaration order.
    pub fn get_batch_export_realms(&self) -> Result<Vec<&RealmConfig>> {
        Ok(self
            .config()?
            .realms
            .values()
            .filter(|realm| realm.batch_export_enabled())
            .collect())
    }

    pub fn get_tables(&self, realm: &str) -> Result<&[TableDef]> {
        self.get_realm(realm)?
            .tables
            .as_deref()
            .ok_or_else(|| Error::TablesNotFound {
                realm: realm.to_string(),
            })
    }

    /// Field definitions before placeholder substitution.
    pub fn get_fields(&self, realm: &str) -> Result<&[FieldDef]> {
        self.get_realm(realm)?
            .fields
            .as_deref()
            .ok_or_else(|| Error::FieldsNotFound {
                realm: realm.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct CountingSource {
        loads: Arc<AtomicUsize>,
        config: RawStatisticsConfig,
    }

    impl ConfigSource for CountingSource {
        fn load(&self) -> Result<RawStatisticsConfig> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.config.clone())
        }
    }

    struct FailingSource;

    impl ConfigSource for FailingSource {
        fn load(&self) -> Result<RawStatisticsConfig> {
            Err(Error::InvalidConfig("rawstatistics.json: missing".to_string()))
        }
    }

    #[test]
    fn loads_once_across_threads() {
        let loads = Arc::new(AtomicUsize::new(0));
        let config = RawStatisticsConfig::from_value(json!({ "realms": { "jobs": {} } }))
            .expect("parse config");
        let store = RealmConfigStore::new(CountingSource {
            loads: Arc::clone(&loads),
            config,
        });

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert!(store.has_realm("jobs").expect("load config"));
                });
            }
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_is_reported_to_every_caller() {
        let store = RealmConfigStore::new(FailingSource);

        let first = store.get_realm("jobs").expect_err("load fails");
        let second = store.get_raw_data_realms().expect_err("load fails");
        assert_eq!(first, second);
    }
}
