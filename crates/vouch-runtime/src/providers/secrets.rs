//! Credential handling for LLM providers.
//!
//! Credentials are wrapped in [`secrecy::SecretString`] as soon as they are
//! read and only exposed where a request header is built. `Debug` and
//! `Display` always print `[REDACTED]`.
//!
//! ## Usage
//!
//! ```ignore
//! let cred = ApiCredential::from_config_or_env(&config, "api_key", "ANTHROPIC_API_KEY", "Anthropic API key")?;
//! request.header("x-api-key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Provider configuration JSON
    Config,
    /// Environment variable
    Environment,
    /// Passed in by the caller
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A provider API key.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from configuration key `config_key`, else from `env_var`.
    ///
    /// Blank values count as absent.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config_value(config, config_key) {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Some(value) = env_value(env_var) {
            return Ok(Self::new(value, CredentialSource::Environment, name));
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in config or {} environment variable",
            name, config_key, env_var
        )))
    }

    /// Like [`from_config_or_env`](Self::from_config_or_env), but absence is
    /// not an error. Used by providers where a key is optional (local servers).
    pub fn optional_from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Option<Self> {
        Self::from_config_or_env(config, config_key, env_var, name).ok()
    }

    /// Check if a credential could be loaded, without loading it.
    pub fn is_available(config: &JsonValue, config_key: &str, env_var: &str) -> bool {
        config_value(config, config_key).is_some() || env_value(env_var).is_some()
    }

    /// Expose the value. Call only where the request header is built.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn config_value<'a>(config: &'a JsonValue, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(JsonValue::as_str)
        .filter(|value| !value.trim().is_empty())
}

fn env_value(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "sk-super-secret-key-12345";

    #[test]
    fn test_credential_redacted() {
        let cred = ApiCredential::new(SECRET, CredentialSource::Config, "Test API key");

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(SECRET), "Secret exposed in Debug!");
        assert!(debug.contains("[REDACTED]"));

        let display = format!("{}", cred);
        assert!(!display.contains(SECRET), "Secret exposed in Display!");
        assert!(display.contains("Test API key from config"));
    }

    #[test]
    fn test_credential_expose() {
        let cred = ApiCredential::new(SECRET, CredentialSource::Programmatic, "Test API key");
        assert_eq!(cred.expose(), SECRET);
        assert_eq!(cred.source(), CredentialSource::Programmatic);
    }

    #[test]
    fn test_config_wins_over_env() {
        std::env::set_var("VOUCH_TEST_KEY_PRIORITY", "env-key");
        let config = serde_json::json!({ "api_key": "config-key" });

        let cred = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            "VOUCH_TEST_KEY_PRIORITY",
            "Test key",
        )
        .unwrap();
        assert_eq!(cred.expose(), "config-key");
        assert_eq!(cred.source(), CredentialSource::Config);

        std::env::remove_var("VOUCH_TEST_KEY_PRIORITY");
    }

    #[test]
    fn test_blank_config_falls_back_to_env() {
        std::env::set_var("VOUCH_TEST_KEY_FALLBACK", "env-key");
        let config = serde_json::json!({ "api_key": "  " });

        let cred = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            "VOUCH_TEST_KEY_FALLBACK",
            "Test key",
        )
        .unwrap();
        assert_eq!(cred.expose(), "env-key");
        assert_eq!(cred.source(), CredentialSource::Environment);

        std::env::remove_var("VOUCH_TEST_KEY_FALLBACK");
    }

    #[test]
    fn test_missing_credential() {
        let config = serde_json::json!({});
        let err = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            "VOUCH_TEST_KEY_NONEXISTENT",
            "Test key",
        )
        .unwrap_err();
        assert!(err.to_string().contains("VOUCH_TEST_KEY_NONEXISTENT"));

        assert!(ApiCredential::optional_from_config_or_env(
            &config,
            "api_key",
            "VOUCH_TEST_KEY_NONEXISTENT",
            "Test key"
        )
        .is_none());
        assert!(!ApiCredential::is_available(
            &config,
            "api_key",
            "VOUCH_TEST_KEY_NONEXISTENT"
        ));
    }
}
