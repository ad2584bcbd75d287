//! Shared types for the verification pipeline.
//!
//! Requests flow in, decisions flow out. Decisions are built once per chat
//! turn and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference snippet a draft answer must be grounded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Snippet text
    pub text: String,
}

impl EvidenceItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for EvidenceItem {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for EvidenceItem {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// Input to the fact-check stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    /// The user's question
    pub question: String,

    /// The answer produced by the chat model
    pub draft_answer: String,

    /// Ordered evidence; order determines source numbering
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
}

impl EvaluationRequest {
    pub fn new(question: impl Into<String>, draft_answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            draft_answer: draft_answer.into(),
            evidence: Vec::new(),
        }
    }

    /// Append evidence items in order.
    pub fn with_evidence<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EvidenceItem>,
    {
        self.evidence.extend(items.into_iter().map(Into::into));
        self
    }
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role-tagged message sent to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Three-valued outcome of the fact-check stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Every statement is supported by the evidence
    Pass,

    /// At least one statement is contradicted or unsupported
    Fail,

    /// Not enough signal to decide
    #[default]
    Indeterminate,
}

impl Verdict {
    /// All verdicts, in display order.
    pub const ALL: [Verdict; 3] = [Verdict::Pass, Verdict::Fail, Verdict::Indeterminate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider and model a stage should call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTarget {
    /// Registered provider name (e.g., "anthropic")
    pub provider: String,

    /// Model name; `None` lets the provider pick its default
    pub model: Option<String>,
}

impl ModelTarget {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model {
            Some(model) => write!(f, "{}/{}", self.provider, model),
            None => f.write_str(&self.provider),
        }
    }
}

/// Result of the fact-check stage.
///
/// `verdict` is always one of the three [`Verdict`] values, never raw model
/// text. `revised_answer` is empty unless the model supplied a replacement in
/// a reply that could be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckDecision {
    pub verdict: Verdict,

    /// Human-readable explanation, never empty
    pub summary: String,

    /// Grounded replacement answer, or empty
    pub revised_answer: String,

    /// Raw model reply (empty when the model was not reached)
    pub raw: String,

    pub provider: Option<String>,

    pub model: Option<String>,

    /// Wall-clock time spent in the model call
    pub duration_ms: Option<u64>,

    /// Why the check could not be completed, if it could not
    pub error: Option<String>,

    /// Whether a model reply was obtained and understood
    pub applied: bool,

    pub checked_at: DateTime<Utc>,
}

/// Summary attached to decisions produced while the stage is switched off.
pub const DISABLED_SUMMARY: &str = "Fact checking is disabled; the answer was not verified.";

impl FactCheckDecision {
    /// Decision returned when fact checking is switched off.
    pub fn disabled() -> Self {
        Self {
            verdict: Verdict::Indeterminate,
            summary: DISABLED_SUMMARY.to_string(),
            revised_answer: String::new(),
            raw: String::new(),
            provider: None,
            model: None,
            duration_ms: None,
            error: None,
            applied: false,
            checked_at: Utc::now(),
        }
    }

    /// The answer a caller should deliver.
    ///
    /// Returns the revised answer only when the verdict is `fail` and the
    /// model supplied a non-empty revision; otherwise the draft.
    pub fn delivered_answer<'a>(&'a self, draft: &'a str) -> &'a str {
        if self.verdict == Verdict::Fail && !self.revised_answer.trim().is_empty() {
            &self.revised_answer
        } else {
            draft
        }
    }

    /// Display status for audit UIs.
    pub fn status(&self) -> FactCheckStatus {
        if self.error.is_some() {
            return FactCheckStatus::Unavailable;
        }
        if !self.applied {
            return FactCheckStatus::Disabled;
        }
        match self.verdict {
            Verdict::Pass => FactCheckStatus::Verified,
            Verdict::Fail => FactCheckStatus::Flagged,
            Verdict::Indeterminate => FactCheckStatus::NeedsContext,
        }
    }
}

/// What an audit badge should show for a fact-check decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCheckStatus {
    Disabled,
    Unavailable,
    Verified,
    Flagged,
    NeedsContext,
}

impl FactCheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FactCheckStatus::Disabled => "Fact check skipped",
            FactCheckStatus::Unavailable => "Fact check unavailable",
            FactCheckStatus::Verified => "Verified by fact checker",
            FactCheckStatus::Flagged => "Fact checker flagged issues",
            FactCheckStatus::NeedsContext => "Fact checker needs more context",
        }
    }
}

/// Result of the response-guard stage.
///
/// Fields are private so the blocking invariant holds: a blocked decision
/// carries the fallback text and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardDecision {
    allow: bool,
    text: String,
}

impl GuardDecision {
    /// Deliver `text` unchanged.
    pub fn allowed(text: impl Into<String>) -> Self {
        Self {
            allow: true,
            text: text.into(),
        }
    }

    /// Replace the audited text with `fallback_text`.
    pub fn blocked(fallback_text: impl Into<String>) -> Self {
        Self {
            allow: false,
            text: fallback_text.into(),
        }
    }

    pub fn allow(&self) -> bool {
        self.allow
    }

    /// Text to deliver to the user.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_serializes_lowercase() {
        let json = serde_json::to_string(&Verdict::Indeterminate).unwrap();
        assert_eq!(json, "\"indeterminate\"");
        assert_eq!(Verdict::Pass.to_string(), "pass");
    }

    #[test]
    fn test_request_builder_keeps_order() {
        let request = EvaluationRequest::new("q", "a").with_evidence(["first", "second"]);
        assert_eq!(request.evidence[0].text, "first");
        assert_eq!(request.evidence[1].text, "second");
    }

    #[test]
    fn test_disabled_decision() {
        let decision = FactCheckDecision::disabled();
        assert_eq!(decision.verdict, Verdict::Indeterminate);
        assert!(!decision.applied);
        assert!(decision.revised_answer.is_empty());
        assert_eq!(decision.status(), FactCheckStatus::Disabled);
        assert_eq!(decision.delivered_answer("draft"), "draft");
    }

    #[test]
    fn test_delivered_answer_only_swaps_on_fail() {
        let mut decision = FactCheckDecision::disabled();
        decision.applied = true;
        decision.revised_answer = "Lyon".to_string();

        decision.verdict = Verdict::Pass;
        assert_eq!(decision.delivered_answer("Paris"), "Paris");

        decision.verdict = Verdict::Fail;
        assert_eq!(decision.delivered_answer("Paris"), "Lyon");

        decision.revised_answer = "   ".to_string();
        assert_eq!(decision.delivered_answer("Paris"), "Paris");
    }

    #[test]
    fn test_status_prefers_error() {
        let mut decision = FactCheckDecision::disabled();
        decision.error = Some("timeout".to_string());
        assert_eq!(decision.status(), FactCheckStatus::Unavailable);
        assert_eq!(decision.status().label(), "Fact check unavailable");
    }

    #[test]
    fn test_decision_serializes_camel_case() {
        let value = serde_json::to_value(FactCheckDecision::disabled()).unwrap();
        assert!(value.get("revisedAnswer").is_some());
        assert!(value.get("durationMs").is_some());
        assert_eq!(value["verdict"], "indeterminate");
    }

    #[test]
    fn test_guard_decision_constructors() {
        let allowed = GuardDecision::allowed("hello");
        assert!(allowed.allow());
        assert_eq!(allowed.text(), "hello");

        let blocked = GuardDecision::blocked("Blocked.");
        assert!(!blocked.allow());
        assert_eq!(blocked.into_text(), "Blocked.");
    }

    #[test]
    fn test_model_target_display() {
        assert_eq!(ModelTarget::new("anthropic").to_string(), "anthropic");
        assert_eq!(
            ModelTarget::new("openai").with_model("gpt-4o").to_string(),
            "openai/gpt-4o"
        );
    }
}
