//! Presentation surface: text rendering for tables, summaries, charts, and
//! status messages. All functions are pure formatters; the CLI decides where
//! the text goes.

pub mod render;

pub use render::{
    chart_text, error_line, execution_failure_text, info_line, search_summary, table_text,
    warn_line,
};
