//! Filter stage: equality / substring predicates combined with logical AND.
//!
//! A predicate naming a column the table does not have is treated as "no
//! constraint" rather than an error, and an empty result is a valid,
//! displayable outcome. Filtering never reorders rows.

use super::Table;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    #[default]
    Equals,
    Contains,
}

/// A single (column, operator, value) condition. Values are compared against
/// the cell's canonical rendering, so a value chosen from
/// [`Table::unique_values`] always matches the rows it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Predicate {
    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Equals,
            value: value.into(),
        }
    }

    pub fn contains(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Contains,
            value: value.into(),
        }
    }

    fn matches(&self, rendered: &str) -> bool {
        match self.op {
            FilterOp::Equals => rendered == self.value,
            FilterOp::Contains => rendered.contains(&self.value),
        }
    }
}

/// Ordered list of predicates combined with AND. The interactive surface caps
/// the list at three; the stage itself accepts any number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn clear(&mut self) {
        self.predicates.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Sub-table whose rows satisfy every predicate, in original row order.
    pub fn apply(&self, table: &Table) -> Table {
        // Resolve column indices once; absent columns drop out here.
        let resolved: Vec<(usize, &Predicate)> = self
            .predicates
            .iter()
            .filter_map(|p| table.column_index(&p.column).map(|idx| (idx, p)))
            .collect();

        if resolved.is_empty() {
            return table.clone();
        }

        table.retain_rows(|row| {
            resolved
                .iter()
                .all(|(idx, p)| p.matches(&row[*idx].render()))
        })
    }
}
