//! # daver
//!
//! Data assistant for a spreadsheet-backed team table. The crate loads a
//! shared spreadsheet through its CSV export, lets users narrow it with
//! column/value filters, and answers free-text questions by asking a hosted
//! generative model for a constrained JSON analysis plan that is validated
//! and executed locally.
//!
//! ## Pipeline
//!
//! One user action runs load → filter → prompt → model call → plan execution
//! synchronously. The loaded table is cached with a TTL and never mutated;
//! every stage produces a new value, and every failure is local to the
//! triggering action.
//!
//! The model never returns executable code to this crate. It returns a JSON
//! plan drawn from an enumerated operation set ([`analysis::AnalysisOp`]),
//! validated against a published schema before a single step runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use daver::{AppConfig, Assistant, FilterSet, ModelClient, Predicate};
//! use daver::model::GenerationOptions;
//! use daver::sheet::{HttpSheetFetcher, SheetSource, SheetStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> daver::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let source = SheetSource::from_share_url(&config.sheet_url)?;
//!     let store = Arc::new(SheetStore::new(
//!         source,
//!         Arc::new(HttpSheetFetcher::new()?),
//!         config.refresh_ttl(),
//!         config.timestamp_gid,
//!     ));
//!     let client = ModelClient::new(&config.model, GenerationOptions::default())?;
//!     let assistant = Assistant::new(store, client, config.sample_rows);
//!
//!     let filters = FilterSet::new().with(Predicate::equals("Crop", "Cotton"));
//!     let outcome = assistant.ask(&filters, "수확량을 요약해줘").await?;
//!     println!("{}", daver::surface::table_text(&outcome.analysis.table));
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`table`] | In-memory table, CSV parsing, filter predicates |
//! | [`sheet`] | Export-URL derivation, HTTP fetch, TTL store |
//! | [`prompt`] | Prompt construction from table shape and question |
//! | [`model`] | Gemini generateContent client and credentials |
//! | [`reply`] | Two-section response splitting with fallback |
//! | [`analysis`] | Plan schema, validation, and execution |
//! | [`request`] | Per-request context and phase state machine |
//! | [`assistant`] | The orchestrator tying the stages together |
//! | [`surface`] | Text rendering for tables, charts, messages |
//! | [`config`] | YAML + environment configuration |

pub mod analysis;
pub mod assistant;
pub mod config;
pub mod model;
pub mod prompt;
pub mod reply;
pub mod request;
pub mod sheet;
pub mod surface;
pub mod table;

// Re-export main types for convenience
pub use assistant::{AskOutcome, Assistant, SearchOutcome};
pub use config::AppConfig;
pub use model::ModelClient;
pub use reply::{ModelReply, PLAN_SECTION_HEADER};
pub use request::{RequestContext, RequestPhase};
pub use table::{CellValue, FilterOp, FilterSet, Predicate, Table};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
