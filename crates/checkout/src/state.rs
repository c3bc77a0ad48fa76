//! Order creation workflow stages.

use serde::{Deserialize, Serialize};

/// The stage an order creation run is in.
///
/// Stage transitions:
/// ```text
/// Validating ──► Reserving ──► Pricing ──► Persisting ──► ClearingCart ──► Notifying ──► Done
///     │              │            │            │
///     └──────────────┴────────────┴────────────┴──► Failed
/// ```
///
/// `Persisting` is the commit point: once the order is written, later stages
/// can only log their failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowStage {
    #[default]
    Validating,
    Reserving,
    Pricing,
    Persisting,
    ClearingCart,
    Notifying,

    /// The order was created (terminal state).
    Done,

    /// The run stopped before the order was created (terminal state).
    Failed,
}

impl WorkflowStage {
    /// Returns the stage that follows this one on success.
    pub fn next(&self) -> Option<WorkflowStage> {
        match self {
            WorkflowStage::Validating => Some(WorkflowStage::Reserving),
            WorkflowStage::Reserving => Some(WorkflowStage::Pricing),
            WorkflowStage::Pricing => Some(WorkflowStage::Persisting),
            WorkflowStage::Persisting => Some(WorkflowStage::ClearingCart),
            WorkflowStage::ClearingCart => Some(WorkflowStage::Notifying),
            WorkflowStage::Notifying => Some(WorkflowStage::Done),
            WorkflowStage::Done | WorkflowStage::Failed => None,
        }
    }

    /// Returns true if a failure in this stage aborts the run.
    ///
    /// Cart clearing and notification are best-effort.
    pub fn can_fail(&self) -> bool {
        matches!(
            self,
            WorkflowStage::Validating
                | WorkflowStage::Reserving
                | WorkflowStage::Pricing
                | WorkflowStage::Persisting
        )
    }

    /// Returns true if a failure in this stage must release the reservation.
    pub fn holds_reservation(&self) -> bool {
        matches!(self, WorkflowStage::Pricing | WorkflowStage::Persisting)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Done | WorkflowStage::Failed)
    }

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Validating => "validating",
            WorkflowStage::Reserving => "reserving",
            WorkflowStage::Pricing => "pricing",
            WorkflowStage::Persisting => "persisting",
            WorkflowStage::ClearingCart => "clearing_cart",
            WorkflowStage::Notifying => "notifying",
            WorkflowStage::Done => "done",
            WorkflowStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stage_is_validating() {
        assert_eq!(WorkflowStage::default(), WorkflowStage::Validating);
    }

    #[test]
    fn test_happy_path_sequence() {
        let mut stage = WorkflowStage::default();
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            stage = next;
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                WorkflowStage::Validating,
                WorkflowStage::Reserving,
                WorkflowStage::Pricing,
                WorkflowStage::Persisting,
                WorkflowStage::ClearingCart,
                WorkflowStage::Notifying,
                WorkflowStage::Done,
            ]
        );
    }

    #[test]
    fn test_can_fail() {
        assert!(WorkflowStage::Validating.can_fail());
        assert!(WorkflowStage::Persisting.can_fail());
        assert!(!WorkflowStage::ClearingCart.can_fail());
        assert!(!WorkflowStage::Notifying.can_fail());
        assert!(!WorkflowStage::Done.can_fail());
    }

    #[test]
    fn test_holds_reservation() {
        assert!(!WorkflowStage::Reserving.holds_reservation());
        assert!(WorkflowStage::Pricing.holds_reservation());
        assert!(WorkflowStage::Persisting.holds_reservation());
        assert!(!WorkflowStage::ClearingCart.holds_reservation());
    }

    #[test]
    fn test_terminal_states() {
        assert!(WorkflowStage::Done.is_terminal());
        assert!(WorkflowStage::Failed.is_terminal());
        assert!(!WorkflowStage::Notifying.is_terminal());
        assert_eq!(WorkflowStage::Failed.next(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(WorkflowStage::ClearingCart.to_string(), "clearing_cart");
        assert_eq!(WorkflowStage::Done.to_string(), "done");
    }
}
