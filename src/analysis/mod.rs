//! Constrained analysis operations executed in place of model-returned code.
//!
//! The model never hands back executable code. It returns a JSON plan drawn
//! from an enumerated set of operations (filter, select, sort, head,
//! aggregate, chart-of-type-X); the plan is validated against a published
//! JSON schema, deserialized into typed operations, and executed against the
//! filtered table. Any failure carries the offending payload so the user can
//! see exactly what the model asked for.

pub mod exec;
pub mod ops;
pub mod schema;

pub use exec::{AnalysisOutcome, ChartSpec};
pub use ops::{AggregateFunc, AnalysisOp, AnalysisPlan, ChartKind};
pub use schema::{parse_plan, plan_schema, plan_schema_text};

use crate::table::Table;
use thiserror::Error;

/// Errors raised while validating or executing an analysis plan. Each variant
/// keeps the payload that produced it for display.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("plan is not valid JSON: {message}")]
    InvalidJson { message: String, payload: String },

    #[error("plan does not match the schema: {message}")]
    SchemaMismatch { message: String, payload: String },

    #[error("plan step {step} failed: {message}")]
    Execution {
        step: usize,
        message: String,
        payload: String,
    },
}

impl AnalysisError {
    /// The payload text the model returned, for diagnosis alongside the
    /// error message.
    pub fn payload(&self) -> &str {
        match self {
            AnalysisError::InvalidJson { payload, .. }
            | AnalysisError::SchemaMismatch { payload, .. }
            | AnalysisError::Execution { payload, .. } => payload,
        }
    }
}

/// Validate, deserialize, and execute a plan payload against a table.
pub fn execute(table: &Table, payload: &str) -> Result<AnalysisOutcome, AnalysisError> {
    let plan = parse_plan(payload)?;
    exec::run_plan(table, &plan, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{CellValue, Table};

    fn table() -> Table {
        Table::new(
            vec!["Crop".into(), "Yield".into()],
            vec![
                vec![CellValue::Text("Cotton".into()), CellValue::Number(10.0)],
                vec![CellValue::Text("Wheat".into()), CellValue::Number(20.0)],
            ],
        )
    }

    #[test]
    fn end_to_end_plan_execution() {
        let payload = r#"{"steps": [
            {"op": "filter", "column": "Crop", "value": "Cotton"},
            {"op": "select", "columns": ["Yield"]}
        ]}"#;
        let outcome = execute(&table(), payload).unwrap();
        assert_eq!(outcome.table.columns(), &["Yield".to_string()]);
        assert_eq!(outcome.table.row_count(), 1);
    }

    #[test]
    fn failures_keep_the_offending_payload() {
        let payload = r#"{"steps": [{"op": "sort", "by": "Ghost"}]}"#;
        let err = execute(&table(), payload).unwrap_err();
        assert!(err.payload().contains("Ghost"));
        assert!(err.to_string().contains("step 1"));
    }
}
