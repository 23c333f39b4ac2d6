use crate::error::RuntimeResult;
use serde::{Deserialize, Serialize};
use tilde_state::StoreConfig;
use tilde_template::TemplateConfig;

/// Settings for an engine instance: template evaluation and store behavior.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub template: TemplateConfig,
    pub store: StoreConfig,
}

impl EngineConfig {
    /// Parse a JSON configuration. Absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> RuntimeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_template(mut self, template: TemplateConfig) -> Self {
        self.template = template;
        self
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_overrides() {
        let config = EngineConfig::from_json_str(
            r#"{"template": {"recursionSafetyLimit": 5}, "store": {"rootSegment": "app"}}"#,
        )
        .unwrap();
        assert_eq!(config.template.recursion_safety_limit, 5);
        assert_eq!(config.template.default_depth, 1);
        assert_eq!(config.store.root_segment, "app");
        assert_eq!(config.store.reference_scan_depth, 50);
    }

    #[test]
    fn test_malformed_json_is_invalid_document() {
        assert!(EngineConfig::from_json_str("[").is_err());
    }
}
