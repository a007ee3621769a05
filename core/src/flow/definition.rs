// zahroflow/src/flow/definition.rs

//! The `Flow<TData, Err>` struct and its structural editing methods.

use crate::core::handler::Handler;
use crate::core::stage::StageDef;
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;

/// Handler phase of a stage. Phases run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub(crate) const ALL: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  pub(crate) fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

/// An ordered list of named stages plus the handlers attached to them.
///
/// `TData` is the data behind the run's [`FlowContext`](crate::FlowContext);
/// `Err` is the error type the flow returns. `Err: From<FlowError>` lets the
/// engine report its own failures (missing handlers) through the same channel.
pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) stages: Vec<StageDef<TData>>,
  pub(crate) handlers: HashMap<(String, Phase), Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>, stages: impl IntoIterator<Item = StageDef<TData>>) -> Self {
    Self {
      name: name.into(),
      stages: stages.into_iter().collect(),
      handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn stage_names(&self) -> Vec<&str> {
    self.stages.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn position(&self, stage: &str) -> FlowResult<usize> {
    self
      .stages
      .iter()
      .position(|s| s.name == stage)
      .ok_or_else(|| FlowError::StageNotFound {
        flow: self.name.clone(),
        stage: stage.to_string(),
      })
  }

  fn ensure_absent(&self, stage: &str) -> FlowResult<()> {
    if self.stages.iter().any(|s| s.name == stage) {
      return Err(FlowError::DuplicateStage {
        flow: self.name.clone(),
        stage: stage.to_string(),
      });
    }
    Ok(())
  }

  pub fn insert_before(&mut self, existing: &str, stage: StageDef<TData>) -> FlowResult<()> {
    let idx = self.position(existing)?;
    self.ensure_absent(&stage.name)?;
    self.stages.insert(idx, stage);
    Ok(())
  }

  pub fn insert_after(&mut self, existing: &str, stage: StageDef<TData>) -> FlowResult<()> {
    let idx = self.position(existing)?;
    self.ensure_absent(&stage.name)?;
    self.stages.insert(idx + 1, stage);
    Ok(())
  }

  /// Removes a stage and every handler attached to it. Unknown names are ignored.
  pub fn remove_stage(&mut self, stage: &str) {
    self.stages.retain(|s| s.name != stage);
    self.handlers.retain(|(name, _), _| name != stage);
  }

  pub(crate) fn handlers_for(&self, stage: &str, phase: Phase) -> &[Handler<TData, Err>] {
    self
      .handlers
      .get(&(stage.to_string(), phase))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub(crate) fn has_handlers(&self, stage: &str) -> bool {
    Phase::ALL
      .iter()
      .any(|phase| !self.handlers_for(stage, *phase).is_empty())
  }
}
