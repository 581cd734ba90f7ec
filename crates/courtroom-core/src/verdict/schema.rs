//! JSON Schema validation for judge verdicts.
//!
//! The judge's JSON is checked against schema/verdict.schema.json before it
//! is deserialized, so a verdict with missing keys, an out-of-range score or
//! an unknown classification is reported field by field.

use std::sync::OnceLock;

/// Embedded verdict schema (loaded at compile time).
const VERDICT_SCHEMA_JSON: &str = include_str!("../../../../schema/verdict.schema.json");

/// Compiled validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(VERDICT_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result.as_ref().map_err(Clone::clone)
}

/// Validate a verdict JSON value against the schema.
///
/// Returns every violation found, formatted as `"<message> at <path>"`.
pub fn validate_verdict_schema(verdict_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(verdict_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
