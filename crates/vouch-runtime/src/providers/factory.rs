//! Provider registry: named provider instances resolved at call time.
//!
//! Stages name their provider with a string (from per-call overrides,
//! environment or workspace preferences). The registry maps that name to a
//! live provider. Factories build providers from JSON configuration so new
//! backends can be added without touching the invoker.
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = ProviderRegistry::new();
//! registry.register(&AnthropicProviderFactory, &serde_json::json!({}))?;
//!
//! let provider = registry.get("anthropic")?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError};

/// Factory for creating LLM providers from configuration.
pub trait ProviderFactory: Send + Sync {
    /// Name the created provider is registered under.
    ///
    /// Examples: "anthropic", "openai"
    fn provider_type(&self) -> &'static str;

    /// Create a provider instance from JSON configuration.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;

    /// Validate configuration without creating a provider.
    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError>;

    /// Human-readable description of this provider.
    fn description(&self) -> &'static str {
        "LLM Provider"
    }
}

/// Registry of live providers, keyed by name.
///
/// Built once at startup and shared behind an `Arc`; lookups take `&self`.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider under its own name, replacing any previous one.
    pub fn insert(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.insert(provider);
        self
    }

    /// Build a provider with `factory` and register it under the factory's type.
    pub fn register(
        &mut self,
        factory: &dyn ProviderFactory,
        config: &JsonValue,
    ) -> Result<(), ProviderError> {
        factory.validate_config(config)?;
        let provider = factory.create(config)?;
        self.providers
            .insert(factory.provider_type().to_string(), provider);
        Ok(())
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.providers.get(name).cloned().ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider: '{}'. Available: {:?}",
                name,
                self.available_types()
            ))
        })
    }

    /// List registered provider names.
    pub fn available_types(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a provider is registered.
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Register every built-in provider whose credentials are available.
    ///
    /// Each entry of `config` is the provider-specific configuration for the
    /// provider of that name; missing entries use an empty object.
    /// Providers that cannot be configured are skipped.
    pub fn with_defaults(config: &JsonValue) -> Self {
        let mut registry = Self::new();
        for factory in builtin_factories() {
            let provider_config = config
                .get(factory.provider_type())
                .cloned()
                .unwrap_or_else(|| serde_json::json!({}));

            match registry.register(factory.as_ref(), &provider_config) {
                Ok(()) => tracing::debug!(
                    provider = factory.provider_type(),
                    "Registered provider"
                ),
                Err(e) => tracing::debug!(
                    provider = factory.provider_type(),
                    error = %e,
                    "Skipping provider"
                ),
            }
        }
        registry
    }
}

fn builtin_factories() -> Vec<Box<dyn ProviderFactory>> {
    #[allow(unused_mut)]
    let mut factories: Vec<Box<dyn ProviderFactory>> = Vec::new();
    #[cfg(feature = "anthropic")]
    factories.push(Box::new(super::AnthropicProviderFactory));
    #[cfg(feature = "openai")]
    factories.push(Box::new(super::OpenAiProviderFactory));
    factories
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}
