//! Model invoker: one awaited call to a named provider.
//!
//! Resolves the provider through the [`ProviderRegistry`], pins the
//! temperature to 0 and bounds the call with a timeout. There are no
//! retries; a failed call is reported once and the stage decides what to do.

use std::sync::Arc;
use std::time::Duration;

use vouch_core::types::{ChatMessage, ModelTarget};

use crate::providers::{CompletionConfig, CompletionResponse, ProviderError, ProviderRegistry};

/// Completion budget for verification replies. The replies are short JSON
/// objects, but a revised answer can run to a few paragraphs.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Executes prompts against registered providers.
#[derive(Debug, Clone)]
pub struct ModelInvoker {
    registry: Arc<ProviderRegistry>,
    max_tokens: u32,
}

impl ModelInvoker {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Send `messages` to `target` and return the reply.
    ///
    /// Unknown providers fail with [`ProviderError::NotConfigured`]; a call
    /// that outlives `timeout` fails with [`ProviderError::Timeout`].
    pub async fn invoke(
        &self,
        target: &ModelTarget,
        messages: Vec<ChatMessage>,
        timeout: Duration,
    ) -> Result<CompletionResponse, ProviderError> {
        let provider = self.registry.get(&target.provider)?;

        let config = CompletionConfig {
            model: target.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            timeout,
        };

        tracing::debug!(
            provider = %target.provider,
            model = target.model.as_deref().unwrap_or(provider.default_model()),
            timeout = ?timeout,
            "Invoking model"
        );

        match tokio::time::timeout(timeout, provider.complete(messages, &config)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout)),
        }
    }
}
