//! Per-request context and the request state machine.
//!
//! Session state is not ambient: each user action gets an immutable
//! [`RequestContext`] snapshot that travels through the pipeline, so nothing
//! leaks between requests. The phases mirror one action's life:
//!
//! Idle → Loading → {Loaded | LoadFailed} → Filtered → PromptBuilt →
//! ModelCalled → {ResponseParsed | ParseFailed} → {Executed |
//! ExecutionFailed} → Displayed
//!
//! Every failed phase terminates the request and returns control to Idle
//! without mutating the loaded table.

use crate::table::FilterSet;
use tracing::debug;
use uuid::Uuid;

/// Immutable snapshot of one user action.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub id: Uuid,
    pub question: String,
    pub filters: FilterSet,
    /// Revision of the sheet store the action ran against.
    pub table_revision: u64,
}

impl RequestContext {
    pub fn new(question: impl Into<String>, filters: FilterSet, table_revision: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            filters,
            table_revision,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Loading,
    Loaded,
    LoadFailed,
    Filtered,
    PromptBuilt,
    ModelCalled,
    ResponseParsed,
    ParseFailed,
    Executed,
    ExecutionFailed,
    Displayed,
}

impl RequestPhase {
    /// Whether this phase ends the request without a displayable result.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RequestPhase::LoadFailed | RequestPhase::ParseFailed | RequestPhase::ExecutionFailed
        )
    }

    /// Legal next phases.
    pub fn can_advance_to(&self, next: RequestPhase) -> bool {
        use RequestPhase::*;
        match (self, next) {
            (Idle, Loading) => true,
            (Loading, Loaded) | (Loading, LoadFailed) => true,
            (Loaded, Filtered) => true,
            (Filtered, PromptBuilt) => true,
            (PromptBuilt, ModelCalled) => true,
            (ModelCalled, ResponseParsed) | (ModelCalled, ParseFailed) => true,
            (ResponseParsed, Executed) | (ResponseParsed, ExecutionFailed) => true,
            (Executed, Displayed) => true,
            // Failures and completion hand control back to Idle.
            (LoadFailed, Idle) | (ParseFailed, Idle) | (ExecutionFailed, Idle) => true,
            (Displayed, Idle) => true,
            _ => false,
        }
    }
}

/// Recorded phase transitions of one request.
#[derive(Debug)]
pub struct RequestTrace {
    request_id: Uuid,
    phases: Vec<RequestPhase>,
}

impl RequestTrace {
    pub fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            phases: vec![RequestPhase::Idle],
        }
    }

    pub fn current(&self) -> RequestPhase {
        *self.phases.last().unwrap_or(&RequestPhase::Idle)
    }

    /// Advance to `next`. Illegal transitions are rejected and leave the
    /// trace unchanged.
    pub fn advance(&mut self, next: RequestPhase) -> bool {
        if !self.current().can_advance_to(next) {
            debug!(
                request = %self.request_id,
                from = ?self.current(),
                to = ?next,
                "rejected phase transition"
            );
            return false;
        }
        debug!(request = %self.request_id, phase = ?next, "request phase");
        self.phases.push(next);
        true
    }

    /// Mark a failure phase and return to Idle in one step.
    pub fn fail(&mut self, failure: RequestPhase) {
        if self.advance(failure) {
            self.advance(RequestPhase::Idle);
        }
    }

    pub fn phases(&self) -> &[RequestPhase] {
        &self.phases
    }
}
