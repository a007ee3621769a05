// zahroflow/src/core/stage.rs

//! Stage definitions: name, optionality, failure tolerance and skip condition.

use super::FlowContext;
use std::sync::Arc;

/// Predicate evaluated before a stage runs; `true` skips the stage.
pub type SkipCondition<TData> = Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

/// One named stage of a [`Flow`](crate::Flow).
///
/// * `optional` stages may be left without handlers.
/// * `best_effort` stages log handler errors and let the run carry on with the
///   next stage instead of failing it.
#[derive(Clone)]
pub struct StageDef<TData: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub best_effort: bool,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static + Send + Sync> StageDef<TData> {
  pub fn required(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: false,
      best_effort: false,
      skip_if: None,
    }
  }

  pub fn optional(name: impl Into<String>) -> Self {
    Self {
      optional: true,
      ..Self::required(name)
    }
  }

  pub fn best_effort(mut self) -> Self {
    self.best_effort = true;
    self
  }

  pub fn skip_if(mut self, condition: impl Fn(&TData) -> bool + Send + Sync + 'static) -> Self {
    self.skip_if = Some(Arc::new(condition));
    self
  }

  pub(crate) fn should_skip(&self, ctx: &FlowContext<TData>) -> bool {
    match &self.skip_if {
      Some(condition) => {
        let guard = ctx.read();
        condition(&guard)
      }
      None => false,
    }
  }
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StageDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StageDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("best_effort", &self.best_effort)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
