//! Record of a single order creation run.

use std::time::Instant;

use common::OrderId;

use crate::state::WorkflowStage;

/// Tracks the stages an order creation run went through.
///
/// The run is kept in memory only; it feeds logs, metrics and tests.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    stage: WorkflowStage,
    history: Vec<WorkflowStage>,
    failed_at: Option<WorkflowStage>,
    failure_reason: Option<String>,
    order_id: Option<OrderId>,
    /// Side-effect failures that were logged and swallowed.
    warnings: Vec<String>,
    started: Instant,
}

impl Default for WorkflowRun {
    fn default() -> Self {
        Self::start()
    }
}

impl WorkflowRun {
    /// Starts a run in the `Validating` stage.
    pub fn start() -> Self {
        Self {
            stage: WorkflowStage::Validating,
            history: vec![WorkflowStage::Validating],
            failed_at: None,
            failure_reason: None,
            order_id: None,
            warnings: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Moves to the next stage. Does nothing once the run is terminal.
    pub fn advance(&mut self) -> WorkflowStage {
        if let Some(next) = self.stage.next() {
            tracing::debug!(from = %self.stage, to = %next, "workflow stage");
            self.stage = next;
            self.history.push(next);
        }
        self.stage
    }

    /// Marks the run failed in its current stage.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.stage.is_terminal() {
            return;
        }
        self.failed_at = Some(self.stage);
        self.failure_reason = Some(reason.into());
        self.stage = WorkflowStage::Failed;
        self.history.push(WorkflowStage::Failed);
    }

    pub(crate) fn record_order(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
    }

    pub(crate) fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

// Query methods
impl WorkflowRun {
    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    /// Every stage entered, in order.
    pub fn history(&self) -> &[WorkflowStage] {
        &self.history
    }

    /// The stage that failed, if any.
    pub fn failed_at(&self) -> Option<WorkflowStage> {
        self.failed_at
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
