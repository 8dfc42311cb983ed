use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Immutable map of `${NAME}` substitutions for human-facing text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    variables: BTreeMap<String, String>,
}

impl VariableStore {
    pub fn new<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            variables: variables
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Replace every known `${NAME}` placeholder in `text`.
    ///
    /// Unknown placeholders are left as written.
    pub fn substitute(&self, text: &str) -> String {
        if self.variables.is_empty() {
            return text.to_string();
        }

        placeholder_pattern()
            .replace_all(text, |caps: &Captures<'_>| match self.variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("Invalid placeholder pattern")
    })
}

/// Organization and hierarchy constants supplied by the hosting environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConstants {
    pub hierarchy_top_level_label: Option<String>,
    pub hierarchy_top_level_info: Option<String>,
    pub hierarchy_middle_level_label: Option<String>,
    pub hierarchy_middle_level_info: Option<String>,
    pub hierarchy_bottom_level_label: Option<String>,
    pub hierarchy_bottom_level_info: Option<String>,
    pub organization_name: Option<String>,
    pub organization_name_abbrev: Option<String>,
}

impl HostConstants {
    /// Placeholder names paired with their configured values.
    pub fn entries(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("HIERARCHY_BOTTOM_LEVEL_INFO", self.hierarchy_bottom_level_info.as_deref()),
            ("HIERARCHY_BOTTOM_LEVEL_LABEL", self.hierarchy_bottom_level_label.as_deref()),
            ("HIERARCHY_MIDDLE_LEVEL_INFO", self.hierarchy_middle_level_info.as_deref()),
            ("HIERARCHY_MIDDLE_LEVEL_LABEL", self.hierarchy_middle_level_label.as_deref()),
            ("HIERARCHY_TOP_LEVEL_INFO", self.hierarchy_top_level_info.as_deref()),
            ("HIERARCHY_TOP_LEVEL_LABEL", self.hierarchy_top_level_label.as_deref()),
            ("ORGANIZATION_NAME", self.organization_name.as_deref()),
            ("ORGANIZATION_NAME_ABBREV", self.organization_name_abbrev.as_deref()),
        ]
    }
}

impl From<&HostConstants> for VariableStore {
    fn from(constants: &HostConstants) -> Self {
        VariableStore::new(
            constants
                .entries()
                .into_iter()
                .filter_map(|(name, value)| value.map(|value| (name, value))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VariableStore {
        VariableStore::new([
            ("ORGANIZATION_NAME", "Center for Computational Research"),
            ("HIERARCHY_TOP_LEVEL_LABEL", "Decanal Unit"),
        ])
    }

    #[test]
    fn substitutes_known_placeholders() {
        assert_eq!(
            store().substitute("The ${HIERARCHY_TOP_LEVEL_LABEL} at ${ORGANIZATION_NAME}"),
            "The Decanal Unit at Center for Computational Research"
        );
    }

    #[test]
    fn leaves_unknown_placeholders() {
        assert_eq!(
            store().substitute("${UNKNOWN} and ${ORGANIZATION_NAME}"),
            "${UNKNOWN} and Center for Computational Research"
        );
        assert_eq!(store().substitute("$ORGANIZATION_NAME {x}"), "$ORGANIZATION_NAME {x}");
    }

    #[test]
    fn substitution_is_idempotent() {
        let once = store().substitute("${HIERARCHY_TOP_LEVEL_LABEL} name");
        assert_eq!(store().substitute(&once), once);
    }

    #[test]
    fn host_constants_skip_unset_values() {
        let constants = HostConstants {
            organization_name: Some("CCR".to_string()),
            hierarchy_bottom_level_label: Some("Department".to_string()),
            ..HostConstants::default()
        };
        let store = VariableStore::from(&constants);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("ORGANIZATION_NAME"), Some("CCR"));
        assert_eq!(store.get("HIERARCHY_BOTTOM_LEVEL_LABEL"), Some("Department"));
        assert_eq!(store.get("ORGANIZATION_NAME_ABBREV"), None);
    }
}
