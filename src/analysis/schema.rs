//! Plan schema generation and payload validation.
//!
//! The schema is generated from the typed operation set, embedded in the
//! prompt so the model knows the exact shape, and enforced here before any
//! step runs. Schema validation runs before typed deserialization.

use super::ops::AnalysisPlan;
use super::AnalysisError;
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde_json::Value;

static PLAN_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let schema = schemars::schema_for!(AnalysisPlan);
    serde_json::to_value(schema).unwrap_or(Value::Null)
});

static COMPILED: Lazy<Option<JSONSchema>> = Lazy::new(|| {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&PLAN_SCHEMA)
        .ok()
});

/// The published JSON schema of [`AnalysisPlan`].
pub fn plan_schema() -> &'static Value {
    &PLAN_SCHEMA
}

/// Pretty-printed schema text for embedding in the prompt.
pub fn plan_schema_text() -> String {
    serde_json::to_string_pretty(plan_schema()).unwrap_or_else(|_| "{}".to_string())
}

/// Parse a payload into a validated plan.
pub fn parse_plan(payload: &str) -> Result<AnalysisPlan, AnalysisError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| AnalysisError::InvalidJson {
            message: e.to_string(),
            payload: payload.to_string(),
        })?;

    if let Some(compiled) = COMPILED.as_ref() {
        if let Err(errors) = compiled.validate(&value) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(AnalysisError::SchemaMismatch {
                message: messages.join("; "),
                payload: payload.to_string(),
            });
        }
    }

    serde_json::from_value(value).map_err(|e| AnalysisError::SchemaMismatch {
        message: e.to_string(),
        payload: payload.to_string(),
    })
}
