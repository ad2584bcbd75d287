//! Verdict policy.
//!
//! Maps parsed replies and failures onto the closed set of outcomes. The two
//! stages fail in opposite directions:
//!
//! - fact-check fails toward [`Verdict::Indeterminate`] and never infers a pass
//! - the guard fails open and only blocks on an explicit `false`

use std::time::Duration;

use chrono::Utc;

use crate::config::GuardConfig;
use crate::parser::{AllowField, FactCheckReply, GuardReply, ParsedResponse};
use crate::types::{FactCheckDecision, GuardDecision, ModelTarget, Verdict};
use crate::PipelineError;

pub const UNREACHABLE_SUMMARY: &str =
    "The fact checker could not be reached, so the answer was not verified.";

pub const UNREADABLE_SUMMARY: &str =
    "The fact checker returned a response that could not be understood, so the answer was not verified.";

const PASS_SUMMARY: &str = "The answer is supported by the provided evidence.";
const FAIL_SUMMARY: &str = "The answer is not fully supported by the provided evidence.";
const INDETERMINATE_SUMMARY: &str = "The evidence is not sufficient to verify the answer.";

/// Normalize a raw verdict token.
///
/// Exact case-insensitive match only. Anything else, including a token with
/// surrounding whitespace, is `Indeterminate`.
pub fn normalize_verdict(token: &str) -> Verdict {
    Verdict::ALL
        .into_iter()
        .find(|verdict| token.eq_ignore_ascii_case(verdict.as_str()))
        .unwrap_or(Verdict::Indeterminate)
}

fn is_recognized(token: &str) -> bool {
    Verdict::ALL
        .iter()
        .any(|verdict| token.eq_ignore_ascii_case(verdict.as_str()))
}

/// Summary used when a parsed reply carries none.
pub fn default_summary(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => PASS_SUMMARY,
        Verdict::Fail => FAIL_SUMMARY,
        Verdict::Indeterminate => INDETERMINATE_SUMMARY,
    }
}

/// Policy outcome of the fact-check stage, before run metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct FactCheckJudgement {
    pub verdict: Verdict,
    pub summary: String,
    pub revised_answer: String,
    /// Problem encountered on the way, if any
    pub issue: Option<PipelineError>,
}

impl FactCheckJudgement {
    /// Whether a model reply was obtained and understood.
    ///
    /// An ambiguous reply still counts: the model answered, its summary is
    /// kept, and only the verdict is downgraded.
    pub fn applied(&self) -> bool {
        !matches!(
            self.issue,
            Some(PipelineError::Provider(_)) | Some(PipelineError::MalformedResponse(_))
        )
    }

    /// Attach run metadata and produce the final decision.
    pub fn into_decision(
        self,
        raw: String,
        target: &ModelTarget,
        duration: Option<Duration>,
    ) -> FactCheckDecision {
        let applied = self.applied();
        let error = match &self.issue {
            Some(issue) if !applied => Some(issue.to_string()),
            _ => None,
        };

        FactCheckDecision {
            verdict: self.verdict,
            summary: self.summary,
            revised_answer: self.revised_answer,
            raw,
            provider: Some(target.provider.clone()),
            model: target.model.clone(),
            duration_ms: duration.map(|d| d.as_millis() as u64),
            error,
            applied,
            checked_at: Utc::now(),
        }
    }
}

/// Judgement for a check that produced no usable reply.
pub fn fact_check_unavailable(error: PipelineError) -> FactCheckJudgement {
    let summary = match error {
        PipelineError::Provider(_) => UNREACHABLE_SUMMARY,
        PipelineError::MalformedResponse(_) | PipelineError::ConfigurationAmbiguity(_) => {
            UNREADABLE_SUMMARY
        }
    };

    FactCheckJudgement {
        verdict: Verdict::Indeterminate,
        summary: summary.to_string(),
        revised_answer: String::new(),
        issue: Some(error),
    }
}

/// Apply fact-check policy to a parsed reply.
pub fn judge_fact_check(parsed: &ParsedResponse) -> FactCheckJudgement {
    let Some(object) = parsed.as_object() else {
        return fact_check_unavailable(PipelineError::MalformedResponse(
            "no JSON object found in fact-check reply".to_string(),
        ));
    };

    let reply = FactCheckReply::from_object(object);

    let (verdict, issue) = match reply.verdict.as_deref() {
        Some(token) if is_recognized(token) => (normalize_verdict(token), None),
        Some(token) => (
            Verdict::Indeterminate,
            Some(PipelineError::ConfigurationAmbiguity(format!(
                "unrecognized verdict '{}'",
                token
            ))),
        ),
        None => (
            Verdict::Indeterminate,
            Some(PipelineError::ConfigurationAmbiguity(
                "fact-check reply has no verdict".to_string(),
            )),
        ),
    };

    FactCheckJudgement {
        verdict,
        summary: reply
            .summary
            .unwrap_or_else(|| default_summary(verdict).to_string()),
        revised_answer: reply.revised_answer.unwrap_or_default(),
        issue,
    }
}

/// Policy outcome of the guard stage.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardJudgement {
    pub allow: bool,
    pub reason: Option<String>,
    pub issue: Option<PipelineError>,
}

/// Judgement for an audit that produced no usable reply. Always allows.
pub fn guard_failed_open(error: PipelineError) -> GuardJudgement {
    GuardJudgement {
        allow: true,
        reason: None,
        issue: Some(error),
    }
}

/// Apply guard policy to a parsed reply.
pub fn judge_guard(parsed: &ParsedResponse) -> GuardJudgement {
    let Some(object) = parsed.as_object() else {
        return guard_failed_open(PipelineError::MalformedResponse(
            "no JSON object found in guard reply".to_string(),
        ));
    };

    let reply = GuardReply::from_object(object);
    match reply.allow {
        AllowField::Explicit(allow) => GuardJudgement {
            allow,
            reason: reply.reason,
            issue: None,
        },
        AllowField::Missing => GuardJudgement {
            allow: true,
            reason: reply.reason,
            issue: Some(PipelineError::ConfigurationAmbiguity(
                "guard reply has no allow field".to_string(),
            )),
        },
        AllowField::Unrecognized(value) => GuardJudgement {
            allow: true,
            reason: reply.reason,
            issue: Some(PipelineError::ConfigurationAmbiguity(format!(
                "guard allow field is not a boolean: {}",
                value
            ))),
        },
    }
}

/// Turn a judgement into the text to deliver.
///
/// A block always delivers the configured fallback, never the audited text
/// or the guard's reason.
pub fn apply_guard_judgement(
    judgement: &GuardJudgement,
    text: &str,
    config: &GuardConfig,
) -> GuardDecision {
    if judgement.allow {
        GuardDecision::allowed(text)
    } else {
        GuardDecision::blocked(config.effective_fallback())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(raw: &str) -> ParsedResponse {
        ParsedResponse::parse(raw)
    }

    #[test]
    fn test_normalize_exact_case_insensitive() {
        assert_eq!(normalize_verdict("pass"), Verdict::Pass);
        assert_eq!(normalize_verdict("FAIL"), Verdict::Fail);
        assert_eq!(normalize_verdict("Indeterminate"), Verdict::Indeterminate);
        assert_eq!(normalize_verdict("passed"), Verdict::Indeterminate);
        assert_eq!(normalize_verdict(" pass "), Verdict::Indeterminate);
        assert_eq!(normalize_verdict(""), Verdict::Indeterminate);
    }

    #[test]
    fn test_pass_reply() {
        let judgement =
            judge_fact_check(&parse(r#"{"verdict":"pass","summary":"supported","revised_answer":""}"#));
        assert_eq!(judgement.verdict, Verdict::Pass);
        assert_eq!(judgement.summary, "supported");
        assert_eq!(judgement.revised_answer, "");
        assert!(judgement.issue.is_none());
        assert!(judgement.applied());
    }

    #[test]
    fn test_fail_reply_keeps_revision() {
        let judgement = judge_fact_check(&parse(
            r#"{"status":"Fail","rationale":"wrong city","corrected_answer":"Paris"}"#,
        ));
        assert_eq!(judgement.verdict, Verdict::Fail);
        assert_eq!(judgement.revised_answer, "Paris");
    }

    #[test]
    fn test_unrecognized_verdict_is_ambiguous_but_applied() {
        let judgement = judge_fact_check(&parse(
            r#"{"verdict":"mostly true","summary":"close enough","revised_answer":"x"}"#,
        ));
        assert_eq!(judgement.verdict, Verdict::Indeterminate);
        assert_eq!(judgement.summary, "close enough");
        assert!(matches!(
            judgement.issue,
            Some(PipelineError::ConfigurationAmbiguity(_))
        ));
        assert!(judgement.applied());
    }

    #[test]
    fn test_missing_summary_gets_default() {
        let judgement = judge_fact_check(&parse(r#"{"verdict":"fail"}"#));
        assert_eq!(judgement.summary, default_summary(Verdict::Fail));

        let judgement = judge_fact_check(&parse(r#"{"summary":"  "}"#));
        assert_eq!(judgement.verdict, Verdict::Indeterminate);
        assert!(!judgement.summary.is_empty());
    }

    #[test]
    fn test_unparseable_reply_is_unavailable() {
        let judgement = judge_fact_check(&parse("I think the answer is right."));
        assert_eq!(judgement.verdict, Verdict::Indeterminate);
        assert_eq!(judgement.summary, UNREADABLE_SUMMARY);
        assert!(judgement.revised_answer.is_empty());
        assert!(!judgement.applied());
    }

    #[test]
    fn test_provider_failure_summary() {
        let judgement = fact_check_unavailable(PipelineError::Provider("timeout".to_string()));
        assert_eq!(judgement.summary, UNREACHABLE_SUMMARY);
        assert!(!judgement.applied());
    }

    #[test]
    fn test_into_decision_sets_error_only_when_not_applied() {
        let target = ModelTarget::new("anthropic").with_model("claude-haiku-4-5");

        let failed = fact_check_unavailable(PipelineError::Provider("boom".to_string()))
            .into_decision(String::new(), &target, Some(Duration::from_millis(12)));
        assert!(!failed.applied);
        assert!(failed.error.as_deref().unwrap().contains("boom"));
        assert_eq!(failed.duration_ms, Some(12));
        assert_eq!(failed.provider.as_deref(), Some("anthropic"));
        assert_eq!(failed.model.as_deref(), Some("claude-haiku-4-5"));

        let ambiguous = judge_fact_check(&parse(r#"{"verdict":"maybe"}"#)).into_decision(
            r#"{"verdict":"maybe"}"#.to_string(),
            &target,
            None,
        );
        assert!(ambiguous.applied);
        assert!(ambiguous.error.is_none());
        assert_eq!(ambiguous.verdict, Verdict::Indeterminate);
    }

    #[test]
    fn test_guard_explicit_false_blocks_with_fallback() {
        let config = GuardConfig {
            enabled: true,
            fallback_text: "Blocked.".to_string(),
            ..GuardConfig::default()
        };
        let judgement = judge_guard(&parse(r#"{"allow":false,"reason":"contains phone number"}"#));
        assert!(!judgement.allow);
        assert_eq!(judgement.reason.as_deref(), Some("contains phone number"));

        let decision = apply_guard_judgement(&judgement, "Call 555-0100", &config);
        assert!(!decision.allow());
        assert_eq!(decision.text(), "Blocked.");
    }

    #[test]
    fn test_guard_blank_fallback_uses_default() {
        let config = GuardConfig {
            fallback_text: "  ".to_string(),
            ..GuardConfig::default()
        };
        let judgement = judge_guard(&parse(r#"{"approve":false}"#));
        let decision = apply_guard_judgement(&judgement, "text", &config);
        assert_eq!(decision.text(), crate::config::DEFAULT_FALLBACK_TEXT);
    }

    #[test]
    fn test_guard_fails_open() {
        let config = GuardConfig::default();
        for raw in [
            "no json here",
            r#"{"reason":"unsure"}"#,
            r#"{"allow":"false"}"#,
            r#"{"allow":0}"#,
        ] {
            let judgement = judge_guard(&parse(raw));
            assert!(judgement.allow, "expected allow for {raw}");
            assert!(judgement.issue.is_some());
            let decision = apply_guard_judgement(&judgement, "original", &config);
            assert_eq!(decision.text(), "original");
        }
    }

    #[test]
    fn test_guard_explicit_true_allows() {
        let judgement = judge_guard(&parse(r#"{"allowed":true}"#));
        assert!(judgement.allow);
        assert!(judgement.issue.is_none());
    }

    proptest! {
        #[test]
        fn prop_normalize_total_and_idempotent(token in ".{0,24}") {
            let verdict = normalize_verdict(&token);
            prop_assert!(Verdict::ALL.contains(&verdict));
            prop_assert_eq!(normalize_verdict(verdict.as_str()), verdict);
        }

        #[test]
        fn prop_case_variants_normalize(idx in 0usize..3, upper in proptest::collection::vec(any::<bool>(), 13)) {
            let verdict = Verdict::ALL[idx];
            let token: String = verdict
                .as_str()
                .chars()
                .zip(upper.iter())
                .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
                .collect();
            prop_assert_eq!(normalize_verdict(&token), verdict);
        }
    }
}
