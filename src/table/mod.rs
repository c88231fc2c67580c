//! In-memory tabular dataset loaded from the spreadsheet.
//!
//! A [`Table`] is an ordered collection of rows over named columns. Tables are
//! never mutated in place: filtering and analysis operations all build a new
//! `Table`, so the loaded snapshot stays intact for the rest of the session.

mod csv;
pub mod filter;

pub use self::csv::parse_csv;
pub use filter::{FilterOp, FilterSet, Predicate};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A single cell: text, number, or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Missing,
}

impl CellValue {
    /// Canonical rendering used for display, equality filters, and unique
    /// value enumeration. Whole numbers render without a trailing `.0` so the
    /// rendered form matches what the source sheet showed.
    pub fn render(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Missing => String::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Ordered rows over named columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Per-column summary used by the prompt builder.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnStats {
    pub name: String,
    pub non_missing: usize,
    pub distinct: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl Table {
    /// Build a table from column names and rows. Rows shorter than the header
    /// are padded with `Missing`; longer rows are truncated to the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.truncate(width);
                while row.len() < width {
                    row.push(CellValue::Missing);
                }
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Distinct rendered values of a column in first-appearance order. Drives
    /// the filter value selector. Missing cells are skipped.
    pub fn unique_values(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.column_index(column) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let cell = &row[idx];
            if cell.is_missing() {
                continue;
            }
            let rendered = cell.render();
            if seen.insert(rendered.clone()) {
                out.push(rendered);
            }
        }
        out
    }

    /// Summary statistics for one column. Numeric fields are `None` when the
    /// column has no numeric cells.
    pub fn column_stats(&self, column: &str) -> Option<ColumnStats> {
        let idx = self.column_index(column)?;
        let mut non_missing = 0usize;
        let mut distinct = HashSet::new();
        let mut numbers = Vec::new();
        for row in &self.rows {
            let cell = &row[idx];
            if cell.is_missing() {
                continue;
            }
            non_missing += 1;
            distinct.insert(cell.render());
            if let Some(n) = cell.as_number() {
                numbers.push(n);
            }
        }
        let (min, max, mean) = if numbers.is_empty() {
            (None, None, None)
        } else {
            let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            (Some(min), Some(max), Some(mean))
        };
        Some(ColumnStats {
            name: column.to_string(),
            non_missing,
            distinct: distinct.len(),
            min,
            max,
            mean,
        })
    }

    pub fn stats(&self) -> Vec<ColumnStats> {
        self.columns
            .iter()
            .filter_map(|c| self.column_stats(c))
            .collect()
    }

    /// New table keeping only the rows for which `keep` returns true, in
    /// original row order.
    pub fn retain_rows(&self, mut keep: impl FnMut(&[CellValue]) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row))
                .cloned()
                .collect(),
        }
    }

    /// Project onto the named columns, in the order given. Unknown names are
    /// skipped rather than erroring, matching the filter stage's contract for
    /// absent columns.
    pub fn select(&self, columns: &[String]) -> Table {
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();
        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Stable sort by one column. Numbers compare numerically, text
    /// lexicographically, mixed cells by rendered form; missing cells sort
    /// last regardless of direction.
    pub fn sort_by(&self, column: &str, descending: bool) -> Table {
        let Some(idx) = self.column_index(column) else {
            return self.clone();
        };
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            let ord = compare_cells(&a[idx], &b[idx]);
            if descending {
                // Keep Missing last even when descending.
                match (a[idx].is_missing(), b[idx].is_missing()) {
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    _ => ord.reverse(),
                }
            } else {
                ord
            }
        });
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Missing, CellValue::Missing) => Ordering::Equal,
        (CellValue::Missing, _) => Ordering::Greater,
        (_, CellValue::Missing) => Ordering::Less,
        (CellValue::Number(x), CellValue::Number(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        _ => a.render().cmp(&b.render()),
    }
}
