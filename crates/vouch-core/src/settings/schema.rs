//! JSON Schema validation for workspace preferences.
//!
//! Every settings object is validated before it replaces the stored value,
//! so a bad write never reaches configuration resolution.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded preferences schema (loaded at compile time).
const PREFERENCES_SCHEMA_JSON: &str =
    include_str!("../../schema/workspace_preferences.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(PREFERENCES_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a preferences JSON value against the schema.
///
/// Returns every violation, formatted with its location.
pub fn validate_preferences_schema(value: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_compiles() {
        assert!(get_validator().is_ok());
    }

    #[test]
    fn test_full_preferences_pass() {
        let value = serde_json::json!({
            "chatProvider": "anthropic",
            "chatModel": "claude-sonnet-4-5",
            "factCheckEnabled": true,
            "factCheckProvider": "openai",
            "factCheckModel": "gpt-4o",
            "responseGuardSettings": {
                "enabled": true,
                "blockPhoneNumbers": true,
                "blockContactNames": false,
                "customRules": "Do not promise refunds.",
                "fallbackText": "This response cannot be provided."
            }
        });
        assert!(validate_preferences_schema(&value).is_ok());
    }

    #[test]
    fn test_nulls_are_accepted() {
        let value = serde_json::json!({
            "chatProvider": null,
            "responseGuardSettings": { "customRules": null }
        });
        assert!(validate_preferences_schema(&value).is_ok());
    }

    #[test]
    fn test_violations_are_reported_with_location() {
        let value = serde_json::json!({
            "responseGuardSettings": { "blockPhoneNumbers": "always" }
        });
        let errors = validate_preferences_schema(&value).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("blockPhoneNumbers"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(validate_preferences_schema(&serde_json::json!([1, 2])).is_err());
    }
}
