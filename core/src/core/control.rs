// zahroflow/src/core/control.rs

//! Flow-control signals returned by handlers and the outcome of a whole run.

/// Returned by a handler to continue or to end the run early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  Continue,
  /// Ends the run without error. Later handlers and stages are not executed.
  Halt,
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  Completed,
  Halted,
}

impl FlowOutcome {
  pub fn is_completed(self) -> bool {
    matches!(self, FlowOutcome::Completed)
  }
}
