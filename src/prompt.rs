//! Prompt construction.
//!
//! The prompt states the table's shape outright so the model does not have to
//! infer it, shows a small sample of literal rows, spells out the two-section
//! response contract, and embeds the user's question verbatim. The question
//! is opaque natural-language text; no validation is applied to it.

use crate::analysis::plan_schema_text;
use crate::reply::PLAN_SECTION_HEADER;
use crate::table::Table;
use std::fmt::Write;

/// Number of literal sample rows included by default.
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

pub struct PromptBuilder<'a> {
    table: &'a Table,
    sample_rows: usize,
    include_stats: bool,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            include_stats: true,
        }
    }

    pub fn sample_rows(mut self, n: usize) -> Self {
        self.sample_rows = n;
        self
    }

    pub fn include_stats(mut self, include: bool) -> Self {
        self.include_stats = include;
        self
    }

    /// Build the full prompt for `question`.
    pub fn build(&self, question: &str) -> String {
        let mut p = String::new();
        let t = self.table;

        let _ = writeln!(
            p,
            "You are a data analyst for a team spreadsheet. The current table has {} rows and {} columns.",
            t.row_count(),
            t.column_count()
        );
        let _ = writeln!(p, "Columns: {}", t.columns().join(", "));
        p.push('\n');

        if self.include_stats {
            let _ = writeln!(p, "Column summary:");
            for s in t.stats() {
                match (s.min, s.max, s.mean) {
                    (Some(min), Some(max), Some(mean)) => {
                        let _ = writeln!(
                            p,
                            "- {}: {} values, {} distinct, min {}, max {}, mean {:.2}",
                            s.name, s.non_missing, s.distinct, min, max, mean
                        );
                    }
                    _ => {
                        let _ = writeln!(
                            p,
                            "- {}: {} values, {} distinct",
                            s.name, s.non_missing, s.distinct
                        );
                    }
                }
            }
            p.push('\n');
        }

        let sample = t.head(self.sample_rows);
        if !sample.is_empty() {
            let _ = writeln!(p, "First {} rows:", sample.row_count());
            let _ = writeln!(p, "{}", render_sample(&sample));
        }

        let _ = writeln!(
            p,
            "Answer in exactly two sections. First, a short rationale in the user's language. \
             Then the line `{}` followed by a single JSON object matching this schema (no other text after it):",
            PLAN_SECTION_HEADER
        );
        let _ = writeln!(p, "```json\n{}\n```", plan_schema_text());
        let _ = writeln!(
            p,
            "The plan operates on the table above. Use only column names that exist. \
             If no table operation is needed, return an empty steps list."
        );
        p.push('\n');
        let _ = writeln!(p, "Question: {}", question);
        p
    }
}

fn render_sample(sample: &Table) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", sample.columns().join(" | "));
    for row in sample.rows() {
        let cells: Vec<String> = row.iter().map(|c| c.render()).collect();
        let _ = writeln!(out, "{}", cells.join(" | "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn table() -> Table {
        Table::new(
            vec!["Crop".into(), "Yield".into()],
            vec![
                vec![CellValue::Text("Cotton".into()), CellValue::Number(10.0)],
                vec![CellValue::Text("Wheat".into()), CellValue::Number(20.0)],
                vec![CellValue::Text("Rice".into()), CellValue::Number(30.0)],
            ],
        )
    }

    #[test]
    fn prompt_states_shape_and_columns() {
        let t = table();
        let prompt = PromptBuilder::new(&t).build("How much cotton?");
        assert!(prompt.contains("3 rows and 2 columns"));
        assert!(prompt.contains("Columns: Crop, Yield"));
    }

    #[test]
    fn prompt_embeds_question_verbatim() {
        let t = table();
        let question = "합계를 알려줘 -- even with; weird || punctuation";
        let prompt = PromptBuilder::new(&t).build(question);
        assert!(prompt.contains(question));
    }

    #[test]
    fn prompt_contains_format_contract_and_schema() {
        let t = table();
        let prompt = PromptBuilder::new(&t).build("q");
        assert!(prompt.contains(PLAN_SECTION_HEADER));
        assert!(prompt.contains("\"steps\""));
    }

    #[test]
    fn sample_rows_are_capped() {
        let t = table();
        let prompt = PromptBuilder::new(&t).sample_rows(2).build("q");
        assert!(prompt.contains("First 2 rows"));
        assert!(prompt.contains("Cotton | 10"));
        assert!(!prompt.contains("Rice | 30"));
    }

    #[test]
    fn stats_can_be_disabled() {
        let t = table();
        let prompt = PromptBuilder::new(&t).include_stats(false).build("q");
        assert!(!prompt.contains("Column summary"));
    }
}
