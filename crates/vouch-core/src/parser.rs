//! Tolerant parsing of model replies.
//!
//! Models are asked for bare JSON but often wrap it in prose or code fences.
//! The parser takes the span from the first `{` to the last `}` and parses
//! that. Anything that does not yield a JSON object is
//! [`ParsedResponse::Unparseable`]; parsing itself never fails.
//!
//! Field extraction goes through fixed resolution tables: for each field the
//! first listed key holding a non-null value wins.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    /// Greedy outer-brace span, across newlines.
    static ref JSON_OBJECT_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Keys accepted for the fact-check verdict.
pub const VERDICT_KEYS: &[&str] = &["verdict", "status", "result"];

/// Keys accepted for the fact-check summary.
pub const SUMMARY_KEYS: &[&str] = &["summary", "reason", "explanation", "rationale"];

/// Keys accepted for the revised answer.
pub const REVISED_ANSWER_KEYS: &[&str] =
    &["revised_answer", "revisedAnswer", "revision", "corrected_answer"];

/// Keys accepted for the guard decision.
pub const ALLOW_KEYS: &[&str] = &["allow", "approve", "allowed"];

/// Keys accepted for the guard reason.
pub const REASON_KEYS: &[&str] = &["reason", "explanation"];

/// Outcome of parsing a raw model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// A JSON object was found
    Parsed(Map<String, Value>),

    /// No JSON object could be recovered
    Unparseable,
}

impl ParsedResponse {
    /// Parse a raw model reply.
    pub fn parse(raw: &str) -> Self {
        let Some(span) = extract_json_span(raw) else {
            return Self::Unparseable;
        };

        match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(object)) => Self::Parsed(object),
            _ => Self::Unparseable,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Parsed(object) => Some(object),
            Self::Unparseable => None,
        }
    }
}

/// The first-`{`-to-last-`}` span of `raw`, if any.
pub fn extract_json_span(raw: &str) -> Option<&str> {
    JSON_OBJECT_SPAN.find(raw).map(|m| m.as_str())
}

/// First key from `keys` whose value is present and not null.
fn resolve_field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// Non-empty trimmed string value of the first resolved key.
fn resolve_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    resolve_field(object, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Fact-check fields recovered from a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactCheckReply {
    /// Raw verdict token, not yet normalized. Non-string values are kept in
    /// their JSON form so they can be reported.
    pub verdict: Option<String>,
    pub summary: Option<String>,
    pub revised_answer: Option<String>,
}

impl FactCheckReply {
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let verdict = resolve_field(object, VERDICT_KEYS).map(|value| match value {
            Value::String(token) => token.clone(),
            other => other.to_string(),
        });

        Self {
            verdict,
            summary: resolve_text(object, SUMMARY_KEYS),
            revised_answer: resolve_text(object, REVISED_ANSWER_KEYS),
        }
    }
}

/// State of the guard's allow field.
#[derive(Debug, Clone, PartialEq)]
pub enum AllowField {
    /// A JSON boolean was supplied
    Explicit(bool),

    /// None of the accepted keys was present
    Missing,

    /// A key was present but its value is not a boolean
    Unrecognized(Value),
}

/// Guard fields recovered from a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardReply {
    pub allow: AllowField,
    pub reason: Option<String>,
}

impl GuardReply {
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let allow = match resolve_field(object, ALLOW_KEYS) {
            Some(Value::Bool(flag)) => AllowField::Explicit(*flag),
            Some(other) => AllowField::Unrecognized(other.clone()),
            None => AllowField::Missing,
        };

        Self {
            allow,
            reason: resolve_text(object, REASON_KEYS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_bare_json() {
        let parsed = ParsedResponse::parse(r#"{"verdict":"pass","summary":"supported"}"#);
        assert!(parsed.is_parsed());
        assert_eq!(parsed.as_object().unwrap()["verdict"], "pass");
    }

    #[test]
    fn test_json_in_prose_and_fences() {
        let raw = "Sure! Here is my verdict:\n```json\n{\"allow\": false,\n \"reason\": \"phone\"}\n```\nHope that helps.";
        let parsed = ParsedResponse::parse(raw);
        assert_eq!(parsed.as_object().unwrap()["allow"], false);
    }

    #[test]
    fn test_nested_object_uses_outer_span() {
        let raw = r#"result: {"verdict": "fail", "details": {"claim": 1}} done"#;
        let parsed = ParsedResponse::parse(raw);
        let map = parsed.as_object().unwrap();
        assert_eq!(map["verdict"], "fail");
        assert_eq!(map["details"]["claim"], 1);
    }

    #[test]
    fn test_unparseable_inputs() {
        assert_eq!(ParsedResponse::parse(""), ParsedResponse::Unparseable);
        assert_eq!(
            ParsedResponse::parse("The answer looks correct to me."),
            ParsedResponse::Unparseable
        );
        assert_eq!(ParsedResponse::parse("{not json}"), ParsedResponse::Unparseable);
        // Two objects: the greedy span covers both and is not valid JSON.
        assert_eq!(
            ParsedResponse::parse(r#"{"allow": true} and {"allow": false}"#),
            ParsedResponse::Unparseable
        );
        assert_eq!(ParsedResponse::parse("[true]"), ParsedResponse::Unparseable);
    }

    #[test]
    fn test_fact_check_key_spellings() {
        let reply = FactCheckReply::from_object(&object(json!({
            "status": "FAIL",
            "explanation": "  wrong city  ",
            "revisedAnswer": "Paris"
        })));
        assert_eq!(reply.verdict.as_deref(), Some("FAIL"));
        assert_eq!(reply.summary.as_deref(), Some("wrong city"));
        assert_eq!(reply.revised_answer.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_fact_check_first_non_null_key_wins() {
        let reply = FactCheckReply::from_object(&object(json!({
            "verdict": null,
            "result": "pass",
            "revised_answer": ""
        })));
        assert_eq!(reply.verdict.as_deref(), Some("pass"));
        assert_eq!(reply.revised_answer, None);
        assert_eq!(reply.summary, None);
    }

    #[test]
    fn test_fact_check_non_string_verdict_is_kept_for_reporting() {
        let reply = FactCheckReply::from_object(&object(json!({ "verdict": true })));
        assert_eq!(reply.verdict.as_deref(), Some("true"));
    }

    #[test]
    fn test_guard_allow_spellings() {
        let reply = GuardReply::from_object(&object(json!({ "approve": false })));
        assert_eq!(reply.allow, AllowField::Explicit(false));

        let reply = GuardReply::from_object(&object(json!({ "allowed": true, "reason": "ok" })));
        assert_eq!(reply.allow, AllowField::Explicit(true));
        assert_eq!(reply.reason.as_deref(), Some("ok"));
    }

    #[test]
    fn test_guard_allow_missing_or_unrecognized() {
        let reply = GuardReply::from_object(&object(json!({ "reason": "?" })));
        assert_eq!(reply.allow, AllowField::Missing);

        let reply = GuardReply::from_object(&object(json!({ "allow": "no", "approve": false })));
        assert_eq!(reply.allow, AllowField::Unrecognized(json!("no")));
    }

    fn json_object_strategy() -> impl Strategy<Value = Value> {
        proptest::collection::btree_map(
            "[a-z_]{1,12}",
            prop_oneof![
                any::<bool>().prop_map(Value::from),
                any::<i32>().prop_map(Value::from),
                "[a-zA-Z0-9 .,]{0,24}".prop_map(Value::from),
            ],
            0..6,
        )
        .prop_map(|map| Value::Object(map.into_iter().collect()))
    }

    proptest! {
        #[test]
        fn prop_prose_does_not_change_parse(
            value in json_object_strategy(),
            prefix in "[^{}]{0,40}",
            suffix in "[^{}]{0,40}",
        ) {
            let bare = serde_json::to_string(&value).unwrap();
            let wrapped = format!("{}{}{}", prefix, bare, suffix);
            prop_assert_eq!(ParsedResponse::parse(&wrapped), ParsedResponse::parse(&bare));
            prop_assert!(ParsedResponse::parse(&bare).is_parsed());
        }
    }
}
