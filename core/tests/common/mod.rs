// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;
use zahroflow::{FlowContext, FlowControl, FlowError, HandlerFuture};

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub stages_executed: Vec<String>,
  pub halt_at: Option<String>,
  pub skip_side_effects: bool,
}

// FlowError does not implement PartialEq, so it is kept as its debug string.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Flow engine error: {0}")]
  Flow(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Handler that bumps the counter, appends `text` and records `label`.
/// Halts when `halt_at` names this label.
pub fn recording_handler(
  label: &'static str,
  text: &'static str,
) -> impl Fn(FlowContext<TestContext>) -> HandlerFuture<TestError> + Send + Sync + 'static {
  move |ctx: FlowContext<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(text);
      guard.stages_executed.push(label.to_string());
      tracing::debug!(target: "test_handlers", label, counter = guard.counter, "executed");
      if guard.halt_at.as_deref() == Some(label) {
        return Ok(FlowControl::Halt);
      }
      Ok(FlowControl::Continue)
    })
  }
}

pub fn failing_handler(
  label: &'static str,
  error_message: &'static str,
) -> impl Fn(FlowContext<TestContext>) -> HandlerFuture<TestError> + Send + Sync + 'static {
  move |ctx: FlowContext<TestContext>| {
    Box::pin(async move {
      ctx.write().stages_executed.push(label.to_string());
      tracing::warn!(target: "test_handlers", label, "failing with: '{}'", error_message);
      Err(TestError::Handler(error_message.to_string()))
    })
  }
}

/// Handler that only counts its invocations in `counter`.
pub fn counting_handler(
  counter: Arc<AtomicUsize>,
) -> impl Fn(FlowContext<TestContext>) -> HandlerFuture<TestError> + Send + Sync + 'static {
  move |_ctx: FlowContext<TestContext>| {
    let counter = counter.clone();
    Box::pin(async move {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(FlowControl::Continue)
    })
  }
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
