//! Splitting the model's free-text response into rationale and plan payload.
//!
//! The prompt asks for a two-section layout separated by a fixed header line.
//! Nothing guarantees the model honors it: a missing header is a recognized
//! case, not an error, and the whole response is then treated as the payload.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed header separating the rationale section from the plan section.
pub const PLAN_SECTION_HEADER: &str = "### PLAN";

// Fence delimiter lines: ```, ```json, ```JSON …
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*```[a-zA-Z]*\s*$").unwrap());

/// A parsed model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    /// Text before the plan header; `None` when the header was absent.
    pub rationale: Option<String>,
    /// The plan payload with code fences stripped. Never empty for a
    /// non-empty response.
    pub payload: String,
}

impl ModelReply {
    /// Split `text` on [`PLAN_SECTION_HEADER`]. Header absent → the entire
    /// response is the payload (fallback path).
    pub fn parse(text: &str) -> Self {
        match text.find(PLAN_SECTION_HEADER) {
            Some(idx) => {
                let rationale = text[..idx].trim();
                let payload = &text[idx + PLAN_SECTION_HEADER.len()..];
                Self {
                    rationale: if rationale.is_empty() {
                        None
                    } else {
                        Some(rationale.to_string())
                    },
                    payload: strip_fences(payload),
                }
            }
            None => Self {
                rationale: None,
                payload: strip_fences(text),
            },
        }
    }
}

/// Remove fence delimiter lines (```` ```json ```` and closing ```` ``` ````),
/// keeping everything between them.
fn strip_fences(text: &str) -> String {
    let without = FENCE_OPEN.replace_all(text, "");
    without.trim().to_string()
}
