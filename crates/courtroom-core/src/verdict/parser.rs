//! Extract a [`Verdict`] from raw judge output.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::schema::validate_verdict_schema;
use crate::types::Verdict;

/// Errors that can occur when parsing a judge verdict.
#[derive(Error, Debug)]
pub enum VerdictError {
    #[error("failed to parse verdict: no JSON object in judge output")]
    NoJsonObject,

    #[error("failed to parse verdict: invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("failed to parse verdict: schema violations: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("failed to parse verdict: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Which strategy produced the JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePath {
    /// The whole output was a JSON object
    Direct,
    /// The object was cut out of surrounding prose, first `{` to last `}`
    Extracted,
}

/// A successfully parsed verdict and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub verdict: Verdict,
    pub path: ParsePath,
}

/// Parse the judge's raw text into a [`Verdict`].
///
/// The whole text is tried as JSON first. If that fails, or yields something
/// other than an object, the substring from the first `{` to the last `}` is
/// tried instead. Whichever object is found must satisfy the verdict schema.
pub fn parse_verdict(raw: &str) -> Result<ParsedVerdict, VerdictError> {
    let (value, path) = locate_object(raw)?;

    validate_verdict_schema(&value).map_err(VerdictError::SchemaViolation)?;

    let verdict: Verdict = serde_json::from_value(value).map_err(VerdictError::Deserialize)?;

    Ok(ParsedVerdict { verdict, path })
}

fn locate_object(raw: &str) -> Result<(Value, ParsePath), VerdictError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        if value.is_object() {
            return Ok((value, ParsePath::Direct));
        }
    }

    debug!("judge output is not a bare JSON object, extracting");

    let start = raw.find('{').ok_or(VerdictError::NoJsonObject)?;
    let end = raw.rfind('}').ok_or(VerdictError::NoJsonObject)?;
    if end < start {
        return Err(VerdictError::NoJsonObject);
    }

    let value: Value =
        serde_json::from_str(&raw[start..=end]).map_err(VerdictError::InvalidJson)?;

    if !value.is_object() {
        return Err(VerdictError::NoJsonObject);
    }

    Ok((value, ParsePath::Extracted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, RiskLevel};
    use proptest::prelude::*;

    const VERDICT_JSON: &str = r#"{"truth_score": 85, "verdict": "TRUTHFUL", "reasoning": "r", "sanction_report": "s", "risk_level": "LOW"}"#;

    #[test]
    fn test_prose_wrapped_verdict() {
        let raw = format!("Here is my verdict: {} Thank you.", VERDICT_JSON);
        let parsed = parse_verdict(&raw).unwrap();

        assert_eq!(parsed.path, ParsePath::Extracted);
        assert_eq!(parsed.verdict.truth_score, 85);
        assert_eq!(parsed.verdict.classification, Classification::Truthful);
        assert_eq!(parsed.verdict.risk_level, RiskLevel::Low);
        assert_eq!(parsed.verdict.reasoning, "r");
        assert_eq!(parsed.verdict.harm_assessment, "s");
    }

    #[test]
    fn test_bare_verdict_is_direct() {
        let raw = format!("\n  {}\n", VERDICT_JSON);
        let parsed = parse_verdict(&raw).unwrap();
        assert_eq!(parsed.path, ParsePath::Direct);
        assert_eq!(parsed.verdict.truth_score, 85);
    }

    #[test]
    fn test_markdown_fenced_verdict() {
        let raw = format!("```json\n{}\n```", VERDICT_JSON);
        let parsed = parse_verdict(&raw).unwrap();
        assert_eq!(parsed.path, ParsePath::Extracted);
    }

    #[test]
    fn test_no_braces() {
        let result = parse_verdict("The witness lied. I find them FABRICATED.");
        assert!(matches!(result, Err(VerdictError::NoJsonObject)));
    }

    #[test]
    fn test_reversed_braces() {
        let result = parse_verdict("} nothing here {");
        assert!(matches!(result, Err(VerdictError::NoJsonObject)));
    }

    #[test]
    fn test_broken_json() {
        let result = parse_verdict("Verdict: {\"truth_score\": 85, \"verdict\": } done");
        assert!(matches!(result, Err(VerdictError::InvalidJson(_))));
    }

    #[test]
    fn test_top_level_array_rejected() {
        let result = parse_verdict("[1, 2, 3]");
        assert!(matches!(result, Err(VerdictError::NoJsonObject)));
    }

    #[test]
    fn test_schema_violation_lists_fields() {
        let raw = r#"{"truth_score": 85, "verdict": "MAYBE", "reasoning": "r", "risk_level": "LOW"}"#;
        match parse_verdict(raw) {
            Err(VerdictError::SchemaViolation(errors)) => {
                assert!(errors.len() >= 2);
            }
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_error_message_prefix() {
        let err = parse_verdict("nope").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse verdict"));
    }

    fn classification() -> impl Strategy<Value = (Classification, &'static str)> {
        prop_oneof![
            Just((Classification::Truthful, "TRUTHFUL")),
            Just((Classification::Partial, "PARTIAL")),
            Just((Classification::Fabricated, "FABRICATED")),
        ]
    }

    fn risk() -> impl Strategy<Value = (RiskLevel, &'static str)> {
        prop_oneof![
            Just((RiskLevel::High, "HIGH")),
            Just((RiskLevel::Medium, "MEDIUM")),
            Just((RiskLevel::Low, "LOW")),
        ]
    }

    proptest! {
        #[test]
        fn prose_around_verdict_never_changes_it(
            score in 0u8..=100,
            (class, class_str) in classification(),
            (risk, risk_str) in risk(),
            reasoning in "[a-zA-Z][a-zA-Z ,.]{0,60}",
            prefix in "[a-zA-Z][a-zA-Z .,:!?]{0,40}",
            suffix in "[a-zA-Z .,:!?]{0,40}",
        ) {
            let json = serde_json::json!({
                "truth_score": score,
                "verdict": class_str,
                "reasoning": reasoning,
                "sanction_report": "harm",
                "risk_level": risk_str,
            })
            .to_string();

            let direct = parse_verdict(&json).unwrap();
            prop_assert_eq!(direct.path, ParsePath::Direct);

            let wrapped = parse_verdict(&format!("{} {} {}", prefix, json, suffix)).unwrap();
            prop_assert_eq!(wrapped.path, ParsePath::Extracted);
            prop_assert_eq!(&wrapped.verdict, &direct.verdict);
            prop_assert_eq!(wrapped.verdict.truth_score, score);
            prop_assert_eq!(wrapped.verdict.classification, class);
            prop_assert_eq!(wrapped.verdict.risk_level, risk);
        }
    }
}
