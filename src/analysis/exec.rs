//! Plan execution against the filtered table.
//!
//! Steps run left to right over a working copy; the input table is never
//! mutated. Unlike the user-facing filter stage, a plan step naming an
//! unknown column is an execution error, surfaced with the payload that
//! produced it.

use super::ops::{AggregateFunc, AnalysisOp, AnalysisPlan, ChartKind};
use super::AnalysisError;
use crate::table::{CellValue, FilterSet, Predicate, Table};
use std::collections::BTreeMap;

/// What a plan produced: the final table, plus an optional chart description
/// captured along the way.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub table: Table,
    pub chart: Option<ChartSpec>,
}

/// A chart over label/value pairs, ready for a rendering surface.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub label_column: String,
    pub value_column: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

pub fn run_plan(
    table: &Table,
    plan: &AnalysisPlan,
    payload: &str,
) -> Result<AnalysisOutcome, AnalysisError> {
    let mut current = table.clone();
    let mut chart = None;

    for (i, step) in plan.steps.iter().enumerate() {
        let step_no = i + 1;
        match apply_step(&current, step) {
            Ok(StepResult::Table(next)) => current = next,
            Ok(StepResult::Chart(spec)) => chart = Some(spec),
            Err(message) => {
                return Err(AnalysisError::Execution {
                    step: step_no,
                    message,
                    payload: payload.to_string(),
                })
            }
        }
    }

    Ok(AnalysisOutcome {
        table: current,
        chart,
    })
}

enum StepResult {
    Table(Table),
    Chart(ChartSpec),
}

fn apply_step(table: &Table, step: &AnalysisOp) -> Result<StepResult, String> {
    match step {
        AnalysisOp::Filter { column, op, value } => {
            require_column(table, column)?;
            let filtered = FilterSet::new()
                .with(Predicate {
                    column: column.clone(),
                    op: *op,
                    value: value.clone(),
                })
                .apply(table);
            Ok(StepResult::Table(filtered))
        }
        AnalysisOp::Select { columns } => {
            for c in columns {
                require_column(table, c)?;
            }
            Ok(StepResult::Table(table.select(columns)))
        }
        AnalysisOp::Sort { by, descending } => {
            require_column(table, by)?;
            Ok(StepResult::Table(table.sort_by(by, *descending)))
        }
        AnalysisOp::Head { n } => Ok(StepResult::Table(table.head(*n))),
        AnalysisOp::Aggregate {
            column,
            func,
            group_by,
        } => aggregate(table, column, *func, group_by.as_deref()).map(StepResult::Table),
        AnalysisOp::Chart {
            kind,
            label_column,
            value_column,
        } => chart_spec(table, *kind, label_column, value_column).map(StepResult::Chart),
    }
}

fn require_column(table: &Table, column: &str) -> Result<usize, String> {
    table
        .column_index(column)
        .ok_or_else(|| format!("column '{}' does not exist", column))
}

fn aggregate(
    table: &Table,
    column: &str,
    func: AggregateFunc,
    group_by: Option<&str>,
) -> Result<Table, String> {
    let value_idx = require_column(table, column)?;

    match group_by {
        None => {
            let value = reduce(table.rows().iter().map(|r| &r[value_idx]), func, column)?;
            Ok(Table::new(
                vec![format!("{}({})", func.name(), column)],
                vec![vec![value]],
            ))
        }
        Some(group_col) => {
            let group_idx = require_column(table, group_col)?;
            // BTreeMap keeps group output deterministic.
            let mut groups: BTreeMap<String, Vec<&CellValue>> = BTreeMap::new();
            for row in table.rows() {
                groups
                    .entry(row[group_idx].render())
                    .or_default()
                    .push(&row[value_idx]);
            }
            let mut rows = Vec::with_capacity(groups.len());
            for (key, cells) in groups {
                let value = reduce(cells.into_iter(), func, column)?;
                rows.push(vec![CellValue::Text(key), value]);
            }
            Ok(Table::new(
                vec![
                    group_col.to_string(),
                    format!("{}({})", func.name(), column),
                ],
                rows,
            ))
        }
    }
}

fn reduce<'a>(
    cells: impl Iterator<Item = &'a CellValue>,
    func: AggregateFunc,
    column: &str,
) -> Result<CellValue, String> {
    let mut numbers = Vec::new();
    let mut non_missing = 0usize;
    for cell in cells {
        if cell.is_missing() {
            continue;
        }
        non_missing += 1;
        if let Some(n) = cell.as_number() {
            numbers.push(n);
        }
    }

    if func == AggregateFunc::Count {
        return Ok(CellValue::Number(non_missing as f64));
    }

    if numbers.len() != non_missing {
        return Err(format!(
            "column '{}' has non-numeric values; {} cannot be applied",
            column,
            func.name()
        ));
    }
    if numbers.is_empty() {
        return Err(format!(
            "column '{}' has no values to {}",
            column,
            func.name()
        ));
    }

    let value = match func {
        AggregateFunc::Count => unreachable!(),
        AggregateFunc::Sum => numbers.iter().sum(),
        AggregateFunc::Mean => numbers.iter().sum::<f64>() / numbers.len() as f64,
        AggregateFunc::Min => numbers.iter().cloned().fold(f64::INFINITY, f64::min),
        AggregateFunc::Max => numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    };
    Ok(CellValue::Number(value))
}

fn chart_spec(
    table: &Table,
    kind: ChartKind,
    label_column: &str,
    value_column: &str,
) -> Result<ChartSpec, String> {
    let label_idx = require_column(table, label_column)?;
    let value_idx = require_column(table, value_column)?;

    let mut labels = Vec::new();
    let mut values = Vec::new();
    for row in table.rows() {
        let value_cell = &row[value_idx];
        if value_cell.is_missing() {
            continue;
        }
        let value = value_cell.as_number().ok_or_else(|| {
            format!(
                "column '{}' has non-numeric values; it cannot be charted",
                value_column
            )
        })?;
        labels.push(row[label_idx].render());
        values.push(value);
    }

    Ok(ChartSpec {
        kind,
        label_column: label_column.to_string(),
        value_column: value_column.to_string(),
        labels,
        values,
    })
}
