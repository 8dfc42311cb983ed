use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RawStatisticsConfig;
use crate::error::{Error, Result};

/// Main configuration file name inside a configuration directory.
pub const CONFIG_FILE_NAME: &str = "rawstatistics.json";

/// Directory of configuration fragments merged after the main file.
pub const CONFIG_FRAGMENT_DIR: &str = "rawstatistics.d";

/// Supplies the parsed raw statistics document to a store.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<RawStatisticsConfig>;
}

/// Source backed by a document that has already been parsed.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    config: RawStatisticsConfig,
}

impl StaticSource {
    pub fn new(config: RawStatisticsConfig) -> Self {
        Self { config }
    }
}

impl ConfigSource for StaticSource {
    fn load(&self) -> Result<RawStatisticsConfig> {
        Ok(self.config.clone())
    }
}

/// Source reading `rawstatistics.json` and `rawstatistics.d/*.json` from a
/// configuration directory.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    config_dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Fragment files in file-name order.
    fn fragment_paths(&self) -> Result<Vec<PathBuf>> {
        let dir = self.config_dir.join(CONFIG_FRAGMENT_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|err| io_error(&dir, err))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| io_error(&dir, err))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl ConfigSource for JsonFileSource {
    fn load(&self) -> Result<RawStatisticsConfig> {
        let main_path = self.config_dir.join(CONFIG_FILE_NAME);
        let mut config = read_document(&main_path)?;

        for path in self.fragment_paths()? {
            let fragment = read_document(&path)?;
            config.merge(fragment, &path.display().to_string())?;
        }

        tracing::debug!(
            event = "config_files_read",
            dir = %self.config_dir.display(),
            realms = config.realms.len()
        );

        Ok(config)
    }
}

fn read_document(path: &Path) -> Result<RawStatisticsConfig> {
    let text = fs::read_to_string(path).map_err(|err| io_error(path, err))?;
    serde_json::from_str(&text)
        .map_err(|err| Error::InvalidConfig(format!("{}: {err}", path.display())))
}

fn io_error(path: &Path, err: std::io::Error) -> Error {
    Error::InvalidConfig(format!("reading {}: {err}", path.display()))
}
