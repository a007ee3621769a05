// zahroflow/src/registry.rs

//! `FlowRegistry<E>`: flows keyed by the type of data they run on.
//!
//! A service registers one flow per context data type at start-up and later
//! dispatches by handing over a `FlowContext<TData>`; the registry finds the
//! flow for `TData` and runs it, reporting errors as the application type `E`.

use crate::core::context_data::FlowContext;
use crate::core::control::FlowOutcome;
use crate::error::FlowError;
use crate::flow::definition::Flow;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedFlow<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  fn name(&self) -> &str;

  /// `ctx` must box a `FlowContext<TData>` for the wrapped flow's `TData`.
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr>;
}

struct RegisteredFlow<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flow: Flow<TData, FlowErr>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, FlowErr, AppErr> ErasedFlow<AppErr> for RegisteredFlow<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<FlowErr> + From<FlowError> + Send + Sync + 'static,
{
  fn name(&self) -> &str {
    self.flow.name()
  }

  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr> {
    let typed = ctx.downcast::<FlowContext<TData>>().map_err(|_| {
      let expected_type = std::any::type_name::<FlowContext<TData>>().to_string();
      event!(Level::ERROR, %expected_type, "Context type mismatch during dispatch.");
      AppErr::from(FlowError::TypeMismatch { expected_type })
    })?;
    self.flow.run(*typed).await.map_err(AppErr::from)
  }
}

/// Registry of flows, one per context data type.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: RwLock<HashMap<TypeId, Arc<dyn ErasedFlow<AppErr>>>>,
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `flow` for its context data type, replacing any previous one.
  pub fn register<TData, FlowErr>(&self, flow: Flow<TData, FlowErr>)
  where
    TData: 'static + Send + Sync,
    FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<FlowErr>,
  {
    event!(
      Level::DEBUG,
      flow = %flow.name(),
      context_type = %std::any::type_name::<TData>(),
      "Registering flow."
    );
    let entry = RegisteredFlow::<TData, FlowErr, AppErr> {
      flow,
      _app_err: PhantomData,
    };
    self.flows.write().insert(TypeId::of::<TData>(), Arc::new(entry));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.flows.read().contains_key(&TypeId::of::<TData>())
  }

  /// Names of all registered flows, sorted.
  pub fn flow_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.flows.read().values().map(|f| f.name().to_string()).collect();
    names.sort();
    names
  }

  /// Runs the flow registered for `TData` against `ctx`.
  pub async fn run<TData>(&self, ctx: FlowContext<TData>) -> Result<FlowOutcome, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let entry = self.flows.read().get(&TypeId::of::<TData>()).cloned();
    let Some(entry) = entry else {
      let context_type = std::any::type_name::<TData>().to_string();
      event!(Level::ERROR, %context_type, "No flow registered for context type.");
      return Err(AppErr::from(FlowError::NotRegistered { context_type }));
    };
    event!(Level::DEBUG, flow = %entry.name(), "Dispatching flow.");
    entry.run_erased(Box::new(ctx)).await
  }
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
