// zahroflow/src/core/handler.rs

use crate::core::context_data::FlowContext;
use crate::core::control::FlowControl;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by a stored handler.
pub type HandlerFuture<Err> = Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>>;

/// A stage handler as stored by a flow.
///
/// Each invocation receives its own clone of the run's [`FlowContext`]. Any
/// `async fn(FlowContext<TData>) -> Result<FlowControl, E>` with `E: Into<Err>`
/// can be registered; the hook methods box it into this shape.
pub type Handler<TData, Err> = Box<dyn Fn(FlowContext<TData>) -> HandlerFuture<Err> + Send + Sync>;

pub(crate) fn boxed<TData, Err, F, Fut, E>(handler_fn: F) -> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: 'static,
  F: Fn(FlowContext<TData>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<FlowControl, E>> + Send + 'static,
  E: Into<Err> + Send + 'static,
{
  Box::new(move |ctx| {
    let fut = handler_fn(ctx);
    Box::pin(async move { fut.await.map_err(Into::into) })
  })
}
