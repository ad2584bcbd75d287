//! Response-guard stage.
//!
//! Audits an answer against the configured compliance rules. The guard
//! fails open: any failure to obtain or understand the audit delivers the
//! original text. Only an explicit `allow: false` blocks, and a block always
//! delivers the configured fallback text.

use std::sync::Arc;
use std::time::Instant;

use vouch_core::config::{ConfigSources, GuardConfig, GuardLayer};
use vouch_core::policy::{apply_guard_judgement, guard_failed_open, judge_guard};
use vouch_core::{prompts, GuardDecision, ParsedResponse, PipelineError};

use crate::invoker::ModelInvoker;
use crate::providers::ProviderRegistry;
use crate::settings::{fetch_or_default, SettingsStore};

const STAGE: &str = "response_guard";

/// Runs the response-guard stage.
#[derive(Debug, Clone)]
pub struct ResponseGuard {
    invoker: ModelInvoker,
}

impl ResponseGuard {
    pub fn new(invoker: ModelInvoker) -> Self {
        Self { invoker }
    }

    pub fn with_registry(registry: Arc<ProviderRegistry>) -> Self {
        Self::new(ModelInvoker::new(registry))
    }

    /// Audit `text` and decide what to deliver.
    ///
    /// Never fails. Disabled, unreachable, unparseable or ambiguous audits
    /// all return `{allow: true, text}`.
    pub async fn apply(&self, text: &str, config: &GuardConfig) -> GuardDecision {
        if !config.enabled {
            tracing::debug!(stage = STAGE, "Response guard disabled, passing through");
            return GuardDecision::allowed(text);
        }

        let target = &config.target;
        let model = target.model.as_deref().unwrap_or("default");
        let messages = prompts::guard_messages(text, config);

        let started = Instant::now();
        let outcome = self.invoker.invoke(target, messages, config.timeout).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let judgement = match outcome {
            Ok(response) => judge_guard(&ParsedResponse::parse(&response.content)),
            Err(e) => guard_failed_open(PipelineError::Provider(e.to_string())),
        };

        if let Some(issue) = &judgement.issue {
            tracing::warn!(
                stage = STAGE,
                provider = %target.provider,
                model = model,
                kind = issue.kind(),
                error = %issue,
                "Response guard failed open"
            );
        }

        let decision = apply_guard_judgement(&judgement, text, config);

        if decision.allow() {
            tracing::debug!(
                stage = STAGE,
                provider = %target.provider,
                model = model,
                duration_ms = duration_ms,
                "Response allowed"
            );
        } else {
            tracing::info!(
                stage = STAGE,
                provider = %target.provider,
                model = model,
                duration_ms = duration_ms,
                reason = judgement.reason.as_deref().unwrap_or(""),
                "Response blocked"
            );
        }

        decision
    }

    /// Resolve configuration with the workspace layer from `store`, then
    /// [`apply`](Self::apply).
    pub async fn apply_with_store(
        &self,
        text: &str,
        per_call: &GuardLayer,
        store: &dyn SettingsStore,
        sources: &ConfigSources,
    ) -> GuardDecision {
        let workspace = fetch_or_default(store, STAGE).await;
        let config = sources.resolve_guard(per_call, &workspace);
        self.apply(text, &config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    };
    use async_trait::async_trait;
    use vouch_core::prompts::{APPROVE_BY_DEFAULT, PHONE_NUMBER_RULE};
    use vouch_core::ModelTarget;

    /// Blocks when the phone rule is active and the text has digits.
    struct RuleAwareAuditor;

    #[async_trait]
    impl LlmProvider for RuleAwareAuditor {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            let user = &messages[1].content;
            let reply = if user.contains(PHONE_NUMBER_RULE) && user.contains("555") {
                r#"{"allow": false, "reason": "phone number"}"#
            } else if user.contains(APPROVE_BY_DEFAULT) {
                r#"{"allow": true}"#
            } else {
                r#"{"allow": true, "reason": "clean"}"#
            };
            Ok(CompletionResponse::text(reply, "auditor-1"))
        }

        fn name(&self) -> &str {
            "auditor"
        }

        fn default_model(&self) -> &str {
            "auditor-1"
        }
    }

    fn guard() -> ResponseGuard {
        let registry = ProviderRegistry::new().with_provider(Arc::new(RuleAwareAuditor));
        ResponseGuard::with_registry(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_rules_reach_the_model() {
        let mut config = GuardConfig::for_target(ModelTarget::new("auditor"));
        config.fallback_text = "Blocked.".to_string();

        let decision = guard().apply("Call 555-0100", &config).await;
        assert!(!decision.allow());
        assert_eq!(decision.text(), "Blocked.");

        config.block_phone_numbers = false;
        let decision = guard().apply("Call 555-0100", &config).await;
        assert!(decision.allow());
        assert_eq!(decision.text(), "Call 555-0100");
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_open() {
        let config = GuardConfig::for_target(ModelTarget::new("nobody"));
        let decision = guard().apply("Call 555-0100", &config).await;
        assert!(decision.allow());
        assert_eq!(decision.text(), "Call 555-0100");
    }
}
