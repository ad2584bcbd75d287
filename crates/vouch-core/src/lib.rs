//! # vouch-core
//!
//! Deterministic building blocks for post-generation answer verification.
//!
//! This crate answers two questions about a chat answer without ever calling
//! a model itself:
//! - Is the draft grounded in the supplied evidence? (fact-check)
//! - Does the draft break a compliance rule? (response guard)
//!
//! It builds the prompts, parses whatever text the model sends back, and
//! applies the verdict policy. The async side lives in `vouch-runtime`.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same request and configuration, same prompt
//! 2. **Closed outcomes**: a verdict is always `pass`, `fail` or `indeterminate`
//! 3. **Fact-check fails toward indeterminate**: a broken reply is never a pass
//! 4. **Guard fails open**: only an explicit `allow: false` blocks
//!
//! ## Example
//!
//! ```rust
//! use vouch_core::{interpret_fact_check, Verdict};
//!
//! let raw = "Here you go: {\"verdict\": \"FAIL\", \"summary\": \"wrong city\", \"revised_answer\": \"Paris\"}";
//! let judgement = interpret_fact_check(raw);
//! assert_eq!(judgement.verdict, Verdict::Fail);
//! assert_eq!(judgement.revised_answer, "Paris");
//! ```

pub mod config;
pub mod evidence;
pub mod parser;
pub mod policy;
pub mod prompts;
pub mod settings;
pub mod types;

// Re-export main types at crate root
pub use config::{
    resolve_fact_check, resolve_guard, ConfigError, ConfigSources, Defaults, EnvOverrides,
    FactCheckConfig, FactCheckLayer, GuardConfig, GuardLayer,
};
pub use evidence::EvidenceCompactor;
pub use parser::{AllowField, FactCheckReply, GuardReply, ParsedResponse};
pub use policy::{
    apply_guard_judgement, fact_check_unavailable, guard_failed_open, judge_fact_check,
    judge_guard, normalize_verdict, FactCheckJudgement, GuardJudgement,
};
pub use settings::{GuardPreferences, WorkspacePreferences};
pub use types::{
    ChatMessage, EvaluationRequest, EvidenceItem, FactCheckDecision, FactCheckStatus,
    GuardDecision, ModelTarget, Role, Verdict,
};

use thiserror::Error;

/// Failures inside a verification stage.
///
/// These never cross the public boundary of the orchestrators; they are
/// converted into a decision and logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Model invocation failed: {0}")]
    Provider(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Ambiguous model decision: {0}")]
    ConfigurationAmbiguity(String),
}

impl PipelineError {
    /// Stable short name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Provider(_) => "provider",
            PipelineError::MalformedResponse(_) => "malformed_response",
            PipelineError::ConfigurationAmbiguity(_) => "configuration_ambiguity",
        }
    }
}

/// Parse a raw fact-check reply and apply the verdict policy.
pub fn interpret_fact_check(raw: &str) -> FactCheckJudgement {
    judge_fact_check(&ParsedResponse::parse(raw))
}

/// Parse a raw guard reply and apply the guard policy.
pub fn interpret_guard(raw: &str) -> GuardJudgement {
    judge_guard(&ParsedResponse::parse(raw))
}
