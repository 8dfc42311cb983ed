use std::path::Path;

use rawstats_core::{HostConstants, VariableStore};
use serde::{Deserialize, Serialize};

use crate::CliError;

/// Host settings read from the constants TOML file.
///
/// ```toml
/// [constants]
/// organization_name = "Center for Computational Research"
/// hierarchy_top_level_label = "Decanal Unit"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostSettings {
    #[serde(default)]
    pub constants: HostConstants,
}

impl HostSettings {
    pub fn variables(&self) -> VariableStore {
        VariableStore::from(&self.constants)
    }
}

/// Load host settings; a missing file yields defaults with no substitutions.
pub fn load_settings(path: Option<&Path>) -> Result<HostSettings, CliError> {
    let Some(path) = path else {
        return Ok(HostSettings::default());
    };
    if !path.exists() {
        tracing::warn!(event = "constants_file_missing", path = %path.display());
        return Ok(HostSettings::default());
    }

    let content = std::fs::read_to_string(path)?;
    let settings: HostSettings = toml::from_str(&content)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_constants_table() {
        let settings: HostSettings = toml::from_str(
            r#"
            [constants]
            organization_name = "Center for Computational Research"
            organization_name_abbrev = "CCR"
            hierarchy_top_level_label = "Decanal Unit"
            "#,
        )
        .expect("parse settings");

        let variables = settings.variables();
        assert_eq!(variables.len(), 3);
        assert_eq!(variables.get("ORGANIZATION_NAME_ABBREV"), Some("CCR"));
        assert_eq!(
            variables.substitute("${HIERARCHY_TOP_LEVEL_LABEL}"),
            "Decanal Unit"
        );
    }

    #[test]
    fn missing_file_means_no_substitutions() {
        let settings = load_settings(Some(Path::new("/nonexistent/constants.toml")))
            .expect("missing file is not an error");

        assert!(settings.variables().is_empty());
    }
}
