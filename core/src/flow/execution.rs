// zahroflow/src/flow/execution.rs

//! `Flow::run`: walks the stages in order and drives their handlers.

use crate::core::context_data::FlowContext;
use crate::core::control::{FlowControl, FlowOutcome};
use crate::core::stage::StageDef;
use crate::error::FlowError;
use crate::flow::definition::{Flow, Phase};
use tracing::{debug_span, event, info_span, trace_span, Instrument, Level};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes the flow against `ctx`.
  ///
  /// Stages run in order; inside a stage the `before`, `on` and `after`
  /// handlers run in that order. A handler returning [`FlowControl::Halt`]
  /// ends the run with [`FlowOutcome::Halted`]. A handler error fails the run,
  /// unless the stage is best-effort, in which case the error is logged and
  /// the remaining handlers of that stage are skipped.
  pub async fn run(&self, ctx: FlowContext<TData>) -> Result<FlowOutcome, Err> {
    let span = info_span!(
      "Flow::run",
      flow = %self.name,
      context_type = %std::any::type_name::<TData>(),
      num_stages = self.stages.len()
    );
    self.run_stages(ctx).instrument(span).await
  }

  async fn run_stages(&self, ctx: FlowContext<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow run starting.");

    for (idx, stage) in self.stages.iter().enumerate() {
      let span = debug_span!(
        "flow_stage",
        stage = stage.name.as_str(),
        stage_index = idx,
        optional = stage.optional,
        best_effort = stage.best_effort
      );
      if self.run_stage(stage, &ctx).instrument(span).await? == FlowControl::Halt {
        event!(Level::INFO, flow = %self.name, stage = %stage.name, "Flow halted by a handler.");
        return Ok(FlowOutcome::Halted);
      }
    }

    event!(Level::DEBUG, "Flow run completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_stage(&self, stage: &StageDef<TData>, ctx: &FlowContext<TData>) -> Result<FlowControl, Err> {
    if stage.should_skip(ctx) {
      event!(Level::DEBUG, "Stage skipped by its skip condition.");
      return Ok(FlowControl::Continue);
    }

    if !self.has_handlers(&stage.name) {
      if stage.optional {
        event!(Level::DEBUG, "Optional stage has no handlers, skipping.");
        return Ok(FlowControl::Continue);
      }
      event!(Level::ERROR, "Required stage has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        stage: stage.name.clone(),
      }));
    }

    for phase in Phase::ALL {
      for (handler_idx, handler_fn) in self.handlers_for(&stage.name, phase).iter().enumerate() {
        let span = trace_span!("flow_handler", phase = phase.as_str(), handler_index = handler_idx);
        match handler_fn(ctx.clone()).instrument(span).await {
          Ok(FlowControl::Continue) => {}
          Ok(FlowControl::Halt) => return Ok(FlowControl::Halt),
          Err(e) if stage.best_effort => {
            event!(
              Level::WARN,
              stage = %stage.name,
              phase = phase.as_str(),
              error = %e,
              "Best-effort stage failed; continuing with the next stage."
            );
            return Ok(FlowControl::Continue);
          }
          Err(e) => {
            event!(Level::ERROR, stage = %stage.name, phase = phase.as_str(), error = %e, "Handler failed.");
            return Err(e);
          }
        }
      }
    }

    event!(Level::DEBUG, "Stage finished.");
    Ok(FlowControl::Continue)
  }
}
