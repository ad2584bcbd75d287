//! Workspace preferences parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::schema::validate_preferences_schema;
use crate::config::{ConfigError, FactCheckLayer, GuardLayer};

/// Stored response-guard settings. Missing keys fall back to defaults at
/// resolution time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_phone_numbers: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_contact_names: Option<bool>,

    /// Free-form rule text appended to the guard requirements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_text: Option<String>,
}

/// Preferences stored for one workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspacePreferences {
    /// Provider used for chat; fallback for both stages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_check_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_check_provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact_check_model: Option<String>,

    pub response_guard_settings: GuardPreferences,
}

impl WorkspacePreferences {
    /// Parse preferences from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse preferences from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse preferences from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse preferences from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Validate a full settings object against the schema, then deserialize.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        validate_preferences_schema(&value)
            .map_err(|errors| ConfigError::ValidationError(errors.join("; ")))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fact-check layer. The dedicated fact-check provider and model win
    /// over the chat ones.
    pub fn fact_check_layer(&self) -> FactCheckLayer {
        FactCheckLayer {
            enabled: self.fact_check_enabled,
            provider: self
                .fact_check_provider
                .clone()
                .or_else(|| self.chat_provider.clone()),
            model: self
                .fact_check_model
                .clone()
                .or_else(|| self.chat_model.clone()),
            ..Default::default()
        }
    }

    /// Guard layer. The guard runs on the chat provider and model.
    pub fn guard_layer(&self) -> GuardLayer {
        let guard = &self.response_guard_settings;
        GuardLayer {
            enabled: guard.enabled,
            block_phone_numbers: guard.block_phone_numbers,
            block_contact_names: guard.block_contact_names,
            custom_rules: guard.custom_rules.clone(),
            fallback_text: guard.fallback_text.clone(),
            provider: self.chat_provider.clone(),
            model: self.chat_model.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFERENCES_YAML: &str = r#"
chatProvider: "openai"
chatModel: "gpt-4o-mini"
factCheckModel: "gpt-4o"
responseGuardSettings:
  enabled: true
  blockContactNames: false
  customRules: "Never mention competitor pricing."
  fallbackText: "Please contact support through the portal."
"#;

    #[test]
    fn test_parse_yaml() {
        let prefs = WorkspacePreferences::from_yaml(PREFERENCES_YAML).unwrap();
        assert_eq!(prefs.chat_provider.as_deref(), Some("openai"));
        assert_eq!(prefs.response_guard_settings.enabled, Some(true));
        assert_eq!(prefs.response_guard_settings.block_phone_numbers, None);
    }

    #[test]
    fn test_layers_from_preferences() {
        let prefs = WorkspacePreferences::from_yaml(PREFERENCES_YAML).unwrap();

        let fact = prefs.fact_check_layer();
        assert_eq!(fact.provider.as_deref(), Some("openai"));
        assert_eq!(fact.model.as_deref(), Some("gpt-4o"));
        assert_eq!(fact.enabled, None);

        let guard = prefs.guard_layer();
        assert_eq!(guard.enabled, Some(true));
        assert_eq!(guard.block_contact_names, Some(false));
        assert_eq!(guard.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_empty_object_is_all_defaults() {
        let prefs = WorkspacePreferences::from_json("{}").unwrap();
        assert_eq!(prefs, WorkspacePreferences::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = WorkspacePreferences::from_json(r#"{"responseGuard": {}}"#);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result =
            WorkspacePreferences::from_json(r#"{"responseGuardSettings": {"enabled": "yes"}}"#);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_json() {
        let result = WorkspacePreferences::from_json("{not json");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_serializes_camel_case_without_nulls() {
        let prefs = WorkspacePreferences {
            chat_provider: Some("anthropic".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&prefs).unwrap();
        assert_eq!(value["chatProvider"], "anthropic");
        assert!(value.get("chatModel").is_none());
        assert!(WorkspacePreferences::from_value(value).is_ok());
    }
}
