// zahroflow/src/flow/hooks.rs

//! Registration of `before`, `on` and `after` handlers.

use crate::core::context_data::FlowContext;
use crate::core::control::FlowControl;
use crate::core::handler::boxed;
use crate::error::{FlowError, FlowResult};
use crate::flow::definition::{Flow, Phase};
use std::future::Future;
use tracing::{event, Level};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn attach<F, Fut, E>(&mut self, stage: &str, phase: Phase, handler_fn: F) -> FlowResult<()>
  where
    F: Fn(FlowContext<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FlowControl, E>> + Send + 'static,
    E: Into<Err> + Send + 'static,
  {
    self.position(stage)?;
    self
      .handlers
      .entry((stage.to_string(), phase))
      .or_default()
      .push(boxed(handler_fn));
    event!(Level::TRACE, flow = %self.name, stage, phase = phase.as_str(), "Handler attached.");
    Ok(())
  }

  pub fn before<F, Fut, E>(&mut self, stage: &str, handler_fn: F) -> FlowResult<()>
  where
    F: Fn(FlowContext<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FlowControl, E>> + Send + 'static,
    E: Into<Err> + Send + 'static,
  {
    self.attach(stage, Phase::Before, handler_fn)
  }

  /// Attaches the main handler of a stage. Several handlers per stage run in
  /// registration order.
  pub fn on<F, Fut, E>(&mut self, stage: &str, handler_fn: F) -> FlowResult<()>
  where
    F: Fn(FlowContext<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FlowControl, E>> + Send + 'static,
    E: Into<Err> + Send + 'static,
  {
    self.attach(stage, Phase::On, handler_fn)
  }

  pub fn after<F, Fut, E>(&mut self, stage: &str, handler_fn: F) -> FlowResult<()>
  where
    F: Fn(FlowContext<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<FlowControl, E>> + Send + 'static,
    E: Into<Err> + Send + 'static,
  {
    self.attach(stage, Phase::After, handler_fn)
  }
}
