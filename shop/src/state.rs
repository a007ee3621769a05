// zahroshop/src/state.rs
use crate::config::AppConfig;
use crate::errors::{AppError, Result as AppResult};
use crate::repo::Repositories;
use crate::services::push_mock::NotificationSink;
use std::sync::Arc;
use uuid::Uuid;
use zahroflow::{FlowRegistry, KeyedLocks};

#[derive(Clone)]
pub struct AppState {
  pub repos: Repositories,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub notifier: Arc<dyn NotificationSink>,
  /// Serializes status changes and payments per order.
  pub order_locks: Arc<KeyedLocks<Uuid>>,
  /// Serializes cart mutations per user.
  pub cart_locks: Arc<KeyedLocks<Uuid>>,
}

impl AppState {
  /// State with every flow registered and fresh lock tables.
  pub fn new(repos: Repositories, config: Arc<AppConfig>, notifier: Arc<dyn NotificationSink>) -> AppResult<Self> {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    crate::pipelines::register_all_pipelines(&flows)?;
    Ok(Self {
      repos,
      flows,
      config,
      notifier,
      order_locks: Arc::new(KeyedLocks::new()),
      cart_locks: Arc::new(KeyedLocks::new()),
    })
  }
}
