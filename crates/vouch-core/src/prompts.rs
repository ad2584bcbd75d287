//! Prompt templates for the fact-check and response-guard stages.
//!
//! Each stage sends exactly two messages: a system message carrying the
//! fixed behavioral contract and a user message carrying the interpolated
//! payload. The output contract is appended to the fact-check system message
//! even when the instructions are overridden, so a custom prompt can change
//! tone but not the reply shape the parser expects.

use crate::config::GuardConfig;
use crate::evidence::EvidenceCompactor;
use crate::types::{ChatMessage, EvaluationRequest};

/// Default fact-checker instructions.
pub const FACT_CHECK_INSTRUCTIONS: &str = "You are a meticulous fact checker. \
Validate the draft answer against the provided evidence and the user question. \
Judge only whether every statement in the draft answer is grounded in the evidence. \
Do not use outside knowledge and do not invent context that the evidence does not contain.";

/// Reply shape required from the fact-check model.
pub const FACT_CHECK_OUTPUT_CONTRACT: &str = r#"
## Output Format
Respond with ONLY a JSON object and no other text:
{
  "verdict": "pass" | "fail" | "indeterminate",
  "summary": "one or two sentences explaining the verdict",
  "revised_answer": "a corrected answer grounded in the evidence, or an empty string"
}

## Verdict Rules
- "pass": every statement in the draft answer is supported by the evidence. Leave revised_answer empty.
- "fail": at least one statement contradicts or is not supported by the evidence. Put a corrected answer that uses only the evidence in revised_answer.
- "indeterminate": the evidence is insufficient to decide. Leave revised_answer empty.
"#;

/// Closing instruction of the fact-check user message.
pub const FACT_CHECK_CLOSING: &str =
    "Return the JSON verdict for the draft answer using only the evidence above.";

/// System message for the response guard.
pub const GUARD_SYSTEM_PROMPT: &str = "You are a strict compliance checker. \
Review the provided assistant message and return ONLY a JSON object with the shape \
{\"allow\": boolean, \"reason\": string}. If any requirement is violated, set allow to false.";

pub const PHONE_NUMBER_RULE: &str =
    "Reject responses that contain phone numbers or explicit requests to call a number.";

pub const CONTACT_NAME_RULE: &str =
    "Reject any invented or speculative names for contacts, representatives, or points of contact.";

/// Requirement text used when no rule is active.
pub const APPROVE_BY_DEFAULT: &str =
    "No additional restrictions were provided. Approve by default.";

/// System message for the fact-check stage.
pub fn fact_check_system_prompt(instructions: Option<&str>) -> String {
    let instructions = instructions
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .unwrap_or(FACT_CHECK_INSTRUCTIONS);
    format!("{}\n{}", instructions, FACT_CHECK_OUTPUT_CONTRACT)
}

/// Build the fact-check message sequence.
pub fn fact_check_messages(
    request: &EvaluationRequest,
    compactor: &EvidenceCompactor,
    instructions: Option<&str>,
) -> Vec<ChatMessage> {
    let evidence = compactor.compact_or_sentinel(&request.evidence);
    let payload = format!(
        "User question: {}\n\nDraft answer: {}\n\nEvidence:\n{}\n\n{}",
        request.question, request.draft_answer, evidence, FACT_CHECK_CLOSING
    );

    vec![
        ChatMessage::system(fact_check_system_prompt(instructions)),
        ChatMessage::user(payload),
    ]
}

/// Active guard rules, in a fixed order.
pub fn guard_rules(config: &GuardConfig) -> Vec<String> {
    let mut rules = Vec::new();
    if config.block_phone_numbers {
        rules.push(PHONE_NUMBER_RULE.to_string());
    }
    if config.block_contact_names {
        rules.push(CONTACT_NAME_RULE.to_string());
    }
    let custom = config.custom_rules.trim();
    if !custom.is_empty() {
        rules.push(custom.to_string());
    }
    rules
}

/// Render rules as a numbered list, or the approve-by-default sentinel.
pub fn render_requirements(rules: &[String]) -> String {
    if rules.is_empty() {
        return APPROVE_BY_DEFAULT.to_string();
    }
    rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| format!("{}. {}", idx + 1, rule))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the guard message sequence for auditing `response_text`.
pub fn guard_messages(response_text: &str, config: &GuardConfig) -> Vec<ChatMessage> {
    let requirements = render_requirements(&guard_rules(config));
    vec![
        ChatMessage::system(GUARD_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Requirements to enforce:\n{}\n\nAssistant message to audit:\n\"\"\"{}\"\"\"",
            requirements, response_text
        )),
    ]
}
