//! Configuration layers and their resolution.
//!
//! Every field resolves through the same precedence, highest first:
//!
//! 1. explicit per-call override
//! 2. environment override
//! 3. workspace stored preference
//! 4. hardcoded default
//!
//! Resolution is a pure function of its inputs. The process environment is
//! only read by [`EnvOverrides::from_process_env`], which callers invoke at
//! their boundary.

use std::time::Duration;
use thiserror::Error;

use crate::evidence::DEFAULT_MAX_EVIDENCE_CHARS;
use crate::settings::WorkspacePreferences;
use crate::types::ModelTarget;

/// Provider used when no layer names one.
pub const DEFAULT_PROVIDER: &str = "anthropic";

/// Model call timeout used when no layer sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Text delivered in place of a blocked answer when none is configured.
pub const DEFAULT_FALLBACK_TEXT: &str = "This response cannot be provided.";

pub const ENV_ENABLE_FACT_CHECKING: &str = "ENABLE_FACT_CHECKING";
pub const ENV_FACT_CHECK_PROVIDER: &str = "FACT_CHECK_LLM_PROVIDER";
pub const ENV_FACT_CHECK_MODEL: &str = "FACT_CHECK_LLM_MODEL";
pub const ENV_FACT_CHECK_PROMPT: &str = "FACT_CHECK_PROMPT";
pub const ENV_FACT_CHECK_TIMEOUT: &str = "FACT_CHECK_TIMEOUT";
pub const ENV_GUARD_ENABLED: &str = "RESPONSE_GUARD_ENABLED";
pub const ENV_GUARD_FALLBACK_TEXT: &str = "RESPONSE_GUARD_FALLBACK_TEXT";
pub const ENV_GUARD_PROVIDER: &str = "RESPONSE_GUARD_LLM_PROVIDER";
pub const ENV_GUARD_MODEL: &str = "RESPONSE_GUARD_LLM_MODEL";
pub const ENV_GUARD_TIMEOUT: &str = "RESPONSE_GUARD_TIMEOUT";
pub const ENV_LLM_PROVIDER: &str = "LLM_PROVIDER";

/// Errors raised while loading configuration sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid boolean for {key}: '{value}'")]
    InvalidBool { key: String, value: String },

    #[error("Invalid duration for {key}: {message}")]
    InvalidDuration { key: String, message: String },

    #[error("Failed to read settings file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Settings validation failed: {0}")]
    ValidationError(String),
}

/// One source of fact-check configuration. `None` defers to the next layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactCheckLayer {
    pub enabled: Option<bool>,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Replacement for the default fact-checker instructions
    pub instructions: Option<String>,
    pub max_evidence_chars: Option<usize>,
    pub timeout: Option<Duration>,
}

/// One source of response-guard configuration. `None` defers to the next layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuardLayer {
    pub enabled: Option<bool>,
    pub block_phone_numbers: Option<bool>,
    pub block_contact_names: Option<bool>,
    pub custom_rules: Option<String>,
    pub fallback_text: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub timeout: Option<Duration>,
}

/// Last-resort values.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub provider: String,
    pub timeout: Duration,
    pub max_evidence_chars: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_evidence_chars: DEFAULT_MAX_EVIDENCE_CHARS,
        }
    }
}

/// Resolved fact-check configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FactCheckConfig {
    pub enabled: bool,
    pub target: ModelTarget,
    pub instructions: Option<String>,
    pub max_evidence_chars: usize,
    pub timeout: Duration,
}

impl Default for FactCheckConfig {
    fn default() -> Self {
        resolve_fact_check(
            &FactCheckLayer::default(),
            &FactCheckLayer::default(),
            &FactCheckLayer::default(),
            &Defaults::default(),
        )
    }
}

impl FactCheckConfig {
    /// An enabled configuration targeting `target`.
    pub fn for_target(target: ModelTarget) -> Self {
        Self {
            enabled: true,
            target,
            ..Self::default()
        }
    }
}

/// Resolved response-guard configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardConfig {
    pub enabled: bool,
    pub block_phone_numbers: bool,
    pub block_contact_names: bool,
    pub custom_rules: String,
    pub fallback_text: String,
    pub target: ModelTarget,
    pub timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        resolve_guard(
            &GuardLayer::default(),
            &GuardLayer::default(),
            &GuardLayer::default(),
            &Defaults::default(),
        )
    }
}

impl GuardConfig {
    /// An enabled configuration with default rules targeting `target`.
    pub fn for_target(target: ModelTarget) -> Self {
        Self {
            enabled: true,
            target,
            ..Self::default()
        }
    }

    /// Fallback text actually delivered on a block.
    pub fn effective_fallback(&self) -> &str {
        if self.fallback_text.trim().is_empty() {
            DEFAULT_FALLBACK_TEXT
        } else {
            &self.fallback_text
        }
    }
}

/// First `Some` across layers, in order.
fn pick<L, T>(layers: &[&L], field: impl Fn(&L) -> Option<T>) -> Option<T> {
    layers.iter().find_map(|layer| field(*layer))
}

/// Like [`pick`], but skips blank strings.
fn pick_text<L>(layers: &[&L], field: impl Fn(&L) -> Option<&String>) -> Option<String> {
    layers
        .iter()
        .filter_map(|layer| field(*layer))
        .find(|value| !value.trim().is_empty())
        .cloned()
}

/// Resolve fact-check configuration from all sources.
pub fn resolve_fact_check(
    per_call: &FactCheckLayer,
    environment: &FactCheckLayer,
    workspace: &FactCheckLayer,
    defaults: &Defaults,
) -> FactCheckConfig {
    let layers = [per_call, environment, workspace];

    let provider =
        pick_text(&layers, |l| l.provider.as_ref()).unwrap_or_else(|| defaults.provider.clone());

    FactCheckConfig {
        enabled: pick(&layers, |l| l.enabled).unwrap_or(true),
        target: ModelTarget {
            provider,
            model: pick_text(&layers, |l| l.model.as_ref()),
        },
        instructions: pick_text(&layers, |l| l.instructions.as_ref()),
        max_evidence_chars: pick(&layers, |l| l.max_evidence_chars)
            .unwrap_or(defaults.max_evidence_chars),
        timeout: pick(&layers, |l| l.timeout).unwrap_or(defaults.timeout),
    }
}

/// Resolve response-guard configuration from all sources.
pub fn resolve_guard(
    per_call: &GuardLayer,
    environment: &GuardLayer,
    workspace: &GuardLayer,
    defaults: &Defaults,
) -> GuardConfig {
    let layers = [per_call, environment, workspace];

    let provider =
        pick_text(&layers, |l| l.provider.as_ref()).unwrap_or_else(|| defaults.provider.clone());

    GuardConfig {
        enabled: pick(&layers, |l| l.enabled).unwrap_or(false),
        block_phone_numbers: pick(&layers, |l| l.block_phone_numbers).unwrap_or(true),
        block_contact_names: pick(&layers, |l| l.block_contact_names).unwrap_or(true),
        // Custom rules may be intentionally cleared, so blanks are honored here.
        custom_rules: pick(&layers, |l| l.custom_rules.clone()).unwrap_or_default(),
        fallback_text: pick_text(&layers, |l| l.fallback_text.as_ref())
            .unwrap_or_else(|| DEFAULT_FALLBACK_TEXT.to_string()),
        target: ModelTarget {
            provider,
            model: pick_text(&layers, |l| l.model.as_ref()),
        },
        timeout: pick(&layers, |l| l.timeout).unwrap_or(defaults.timeout),
    }
}

/// Overrides read from environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub fact_check: FactCheckLayer,
    pub guard: GuardLayer,
    /// Deployment-wide provider, used only when nothing else names one
    pub baseline_provider: Option<String>,
}

impl EnvOverrides {
    /// Parse overrides from `(key, value)` pairs. Empty values count as unset.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut env = Self::default();

        for (key, value) in vars {
            let key = key.as_ref();
            let value: String = value.into();
            if value.trim().is_empty() {
                continue;
            }

            match key {
                ENV_ENABLE_FACT_CHECKING => env.fact_check.enabled = Some(is_true_flag(&value)),
                ENV_FACT_CHECK_PROVIDER => env.fact_check.provider = Some(value),
                ENV_FACT_CHECK_MODEL => env.fact_check.model = Some(value),
                ENV_FACT_CHECK_PROMPT => env.fact_check.instructions = Some(value),
                ENV_FACT_CHECK_TIMEOUT => env.fact_check.timeout = Some(parse_duration(key, &value)?),
                ENV_GUARD_ENABLED => env.guard.enabled = Some(parse_bool(key, &value)?),
                ENV_GUARD_FALLBACK_TEXT => env.guard.fallback_text = Some(value),
                ENV_GUARD_PROVIDER => env.guard.provider = Some(value),
                ENV_GUARD_MODEL => env.guard.model = Some(value),
                ENV_GUARD_TIMEOUT => env.guard.timeout = Some(parse_duration(key, &value)?),
                ENV_LLM_PROVIDER => env.baseline_provider = Some(value),
                _ => continue,
            }
            tracing::debug!(key = key, "Applied environment override");
        }

        // Selecting a fact-check provider, model or prompt enables the check,
        // even over ENABLE_FACT_CHECKING=false.
        if env.fact_check.provider.is_some()
            || env.fact_check.model.is_some()
            || env.fact_check.instructions.is_some()
        {
            env.fact_check.enabled = Some(true);
        }

        Ok(env)
    }

    /// Read overrides from the process environment.
    pub fn from_process_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Defaults with the deployment baseline provider applied.
    pub fn defaults(&self) -> Defaults {
        let mut defaults = Defaults::default();
        if let Some(provider) = &self.baseline_provider {
            defaults.provider = provider.clone();
        }
        defaults
    }
}

/// Environment and defaults, bundled for repeated resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSources {
    pub environment: EnvOverrides,
    pub defaults: Defaults,
}

impl ConfigSources {
    pub fn new(environment: EnvOverrides) -> Self {
        let defaults = environment.defaults();
        Self {
            environment,
            defaults,
        }
    }

    /// Load sources from the process environment.
    pub fn from_process_env() -> Result<Self, ConfigError> {
        Ok(Self::new(EnvOverrides::from_process_env()?))
    }

    pub fn resolve_fact_check(
        &self,
        per_call: &FactCheckLayer,
        workspace: &WorkspacePreferences,
    ) -> FactCheckConfig {
        resolve_fact_check(
            per_call,
            &self.environment.fact_check,
            &workspace.fact_check_layer(),
            &self.defaults,
        )
    }

    pub fn resolve_guard(&self, per_call: &GuardLayer, workspace: &WorkspacePreferences) -> GuardConfig {
        resolve_guard(
            per_call,
            &self.environment.guard,
            &workspace.guard_layer(),
            &self.defaults,
        )
    }
}

/// Only a case-insensitive `true` enables; any other token disables.
fn is_true_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_duration(key: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::InvalidDuration {
        key: key.to_string(),
        message: e.to_string(),
    })
}
