//! The request orchestrator: load → filter → prompt → call → execute.
//!
//! Each user action runs the whole sequence synchronously; there is no
//! background work and no cancellation once the model call has been issued.
//! Failures terminate the action and leave the loaded table untouched.

use crate::analysis::{self, AnalysisOutcome};
use crate::model::ModelClient;
use crate::prompt::PromptBuilder;
use crate::reply::ModelReply;
use crate::request::{RequestContext, RequestPhase, RequestTrace};
use crate::sheet::SheetStore;
use crate::table::{FilterSet, Table};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Result of the manual search path (no model involved).
pub struct SearchOutcome {
    pub context: RequestContext,
    /// The loaded snapshot the search ran against.
    pub loaded: Arc<Table>,
    /// Rows satisfying the filter set, in original order.
    pub filtered: Table,
}

/// Result of a full ask-the-model action.
#[derive(Debug)]
pub struct AskOutcome {
    pub context: RequestContext,
    /// Rationale section of the model's reply, when it produced one.
    pub rationale: Option<String>,
    /// The raw plan payload (shown alongside execution errors elsewhere).
    pub payload: String,
    pub analysis: AnalysisOutcome,
    /// Phase transitions the request went through.
    pub phases: Vec<RequestPhase>,
}

pub struct Assistant {
    store: Arc<SheetStore>,
    client: ModelClient,
    sample_rows: usize,
}

impl Assistant {
    pub fn new(store: Arc<SheetStore>, client: ModelClient, sample_rows: usize) -> Self {
        Self {
            store,
            client,
            sample_rows,
        }
    }

    pub fn store(&self) -> &SheetStore {
        &self.store
    }

    /// Manual search: load the table and apply the user's filters.
    pub async fn search(&self, filters: &FilterSet) -> Result<SearchOutcome> {
        let context =
            RequestContext::new("", filters.clone(), self.store.status().revision);
        let loaded = self.store.table().await?;
        let filtered = filters.apply(&loaded);
        info!(
            request = %context.id,
            matches = filtered.row_count(),
            "search completed"
        );
        Ok(SearchOutcome {
            context,
            loaded,
            filtered,
        })
    }

    /// Full pipeline: load, filter, build the prompt, call the model, parse
    /// its reply, and execute the validated plan against the filtered table.
    pub async fn ask(&self, filters: &FilterSet, question: &str) -> Result<AskOutcome> {
        let context =
            RequestContext::new(question, filters.clone(), self.store.status().revision);
        let mut trace = RequestTrace::new(context.id);

        trace.advance(RequestPhase::Loading);
        let loaded = match self.store.table().await {
            Ok(t) => t,
            Err(e) => {
                trace.fail(RequestPhase::LoadFailed);
                return Err(e.into());
            }
        };
        trace.advance(RequestPhase::Loaded);

        let filtered = filters.apply(&loaded);
        trace.advance(RequestPhase::Filtered);

        let prompt = PromptBuilder::new(&filtered)
            .sample_rows(self.sample_rows)
            .build(question);
        trace.advance(RequestPhase::PromptBuilt);

        trace.advance(RequestPhase::ModelCalled);
        let text = match self.client.generate(&prompt).await {
            Ok(t) => t,
            Err(e) => {
                trace.fail(RequestPhase::ParseFailed);
                return Err(e);
            }
        };

        // Splitting cannot fail: a missing section header falls back to
        // treating the whole response as the payload.
        let reply = ModelReply::parse(&text);
        trace.advance(RequestPhase::ResponseParsed);

        let analysis = match analysis::execute(&filtered, &reply.payload) {
            Ok(outcome) => outcome,
            Err(e) => {
                trace.fail(RequestPhase::ExecutionFailed);
                return Err(e.into());
            }
        };
        trace.advance(RequestPhase::Executed);
        trace.advance(RequestPhase::Displayed);
        trace.advance(RequestPhase::Idle);

        info!(
            request = %context.id,
            rows = analysis.table.row_count(),
            "ask completed"
        );

        Ok(AskOutcome {
            context,
            rationale: reply.rationale,
            payload: reply.payload,
            analysis,
            phases: trace.phases().to_vec(),
        })
    }
}
