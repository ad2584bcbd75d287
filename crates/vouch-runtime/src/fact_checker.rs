//! Fact-check stage.
//!
//! Grounds a draft answer in the supplied evidence. One model call per
//! evaluation; the result is always a complete [`FactCheckDecision`].

use std::sync::Arc;
use std::time::Instant;

use vouch_core::config::{ConfigSources, FactCheckConfig, FactCheckLayer};
use vouch_core::policy::{fact_check_unavailable, judge_fact_check};
use vouch_core::{
    prompts, EvaluationRequest, EvidenceCompactor, FactCheckDecision, ParsedResponse,
    PipelineError,
};

use crate::invoker::ModelInvoker;
use crate::providers::ProviderRegistry;
use crate::settings::{fetch_or_default, SettingsStore};

const STAGE: &str = "fact_check";

/// Runs the fact-check stage.
///
/// Holds only shared, immutable collaborators, so one instance can serve
/// concurrent turns.
#[derive(Debug, Clone)]
pub struct FactChecker {
    invoker: ModelInvoker,
}

impl FactChecker {
    pub fn new(invoker: ModelInvoker) -> Self {
        Self { invoker }
    }

    pub fn with_registry(registry: Arc<ProviderRegistry>) -> Self {
        Self::new(ModelInvoker::new(registry))
    }

    /// Check `request.draft_answer` against `request.evidence`.
    ///
    /// Never fails. When the check cannot be completed the decision is
    /// `indeterminate` with an explanatory summary and `error` set; a reply
    /// that cannot be understood is never treated as a pass. When disabled
    /// no model call is made.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
        config: &FactCheckConfig,
    ) -> FactCheckDecision {
        if !config.enabled {
            tracing::debug!(stage = STAGE, "Fact checking disabled, skipping");
            return FactCheckDecision::disabled();
        }

        let target = &config.target;
        let model = target.model.as_deref().unwrap_or("default");

        let compactor = EvidenceCompactor::new(config.max_evidence_chars);
        let messages =
            prompts::fact_check_messages(request, &compactor, config.instructions.as_deref());

        let started = Instant::now();
        let outcome = self.invoker.invoke(target, messages, config.timeout).await;
        let elapsed = started.elapsed();

        let (judgement, raw) = match outcome {
            Ok(response) => {
                let judgement = judge_fact_check(&ParsedResponse::parse(&response.content));
                (judgement, response.content)
            }
            Err(e) => (
                fact_check_unavailable(PipelineError::Provider(e.to_string())),
                String::new(),
            ),
        };

        if let Some(issue) = &judgement.issue {
            tracing::warn!(
                stage = STAGE,
                provider = %target.provider,
                model = model,
                kind = issue.kind(),
                error = %issue,
                "Fact check degraded to indeterminate"
            );
        }

        let decision = judgement.into_decision(raw, target, Some(elapsed));

        tracing::debug!(
            stage = STAGE,
            provider = %target.provider,
            model = model,
            verdict = %decision.verdict,
            duration_ms = decision.duration_ms,
            "Fact check complete"
        );

        decision
    }

    /// Resolve configuration with the workspace layer from `store`, then
    /// [`evaluate`](Self::evaluate).
    pub async fn evaluate_with_store(
        &self,
        request: &EvaluationRequest,
        per_call: &FactCheckLayer,
        store: &dyn SettingsStore,
        sources: &ConfigSources,
    ) -> FactCheckDecision {
        let workspace = fetch_or_default(store, STAGE).await;
        let config = sources.resolve_fact_check(per_call, &workspace);
        self.evaluate(request, &config).await
    }
}
