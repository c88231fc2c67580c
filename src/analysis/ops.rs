//! The enumerated operation set a plan may use.

use crate::table::FilterOp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One analysis step. Tagged by `op` so the model's JSON reads naturally:
/// `{"op": "filter", "column": "Crop", "value": "Cotton"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AnalysisOp {
    /// Keep rows whose `column` matches `value`.
    Filter {
        column: String,
        #[serde(default, rename = "compare")]
        op: FilterOp,
        value: String,
    },
    /// Project onto the named columns.
    Select { columns: Vec<String> },
    /// Stable sort by one column.
    Sort {
        by: String,
        #[serde(default)]
        descending: bool,
    },
    /// Keep the first `n` rows.
    Head { n: usize },
    /// Reduce a column, optionally per group.
    Aggregate {
        column: String,
        func: AggregateFunc,
        #[serde(default)]
        group_by: Option<String>,
    },
    /// Describe a chart over the current rows. Does not change the table.
    Chart {
        kind: ChartKind,
        label_column: String,
        value_column: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunc {
    Count,
    Sum,
    Mean,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Mean => "mean",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

/// An ordered list of steps, applied left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisPlan {
    pub steps: Vec<AnalysisOp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_op_defaults_to_equals() {
        let step: AnalysisOp =
            serde_json::from_str(r#"{"op": "filter", "column": "Crop", "value": "Cotton"}"#)
                .unwrap();
        assert_eq!(
            step,
            AnalysisOp::Filter {
                column: "Crop".into(),
                op: FilterOp::Equals,
                value: "Cotton".into(),
            }
        );
    }

    #[test]
    fn unknown_operations_are_rejected() {
        let result: Result<AnalysisOp, _> = serde_json::from_str(r#"{"op": "eval", "code": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn aggregate_round_trips() {
        let step = AnalysisOp::Aggregate {
            column: "Yield".into(),
            func: AggregateFunc::Mean,
            group_by: Some("Region".into()),
        };
        let json = serde_json::to_string(&step).unwrap();
        let back: AnalysisOp = serde_json::from_str(&json).unwrap();
        assert_eq!(step, back);
    }
}
