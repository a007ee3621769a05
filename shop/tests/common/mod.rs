// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;
use zahroshop::config::{AppConfig, StorageBackend};
use zahroshop::models::{NewProduct, Product, User};
use zahroshop::repo::{MemoryStore, Repositories};
use zahroshop::services::push_mock::{NotificationSink, SentPushInfo};
use zahroshop::state::AppState;

pub const ADMIN_TOKEN: &str = "admin-secret";
pub const CUSTOMER_TOKEN: &str = "customer-secret";

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// Notification sink that keeps every message it is asked to deliver.
#[derive(Default)]
pub struct RecordingSink {
  pub sent: Mutex<Vec<(Uuid, String, String)>>,
}

impl RecordingSink {
  pub fn count(&self) -> usize {
    self.sent.lock().len()
  }

  pub fn bodies(&self) -> Vec<String> {
    self.sent.lock().iter().map(|(_, _, body)| body.clone()).collect()
  }
}

#[async_trait]
impl NotificationSink for RecordingSink {
  async fn send(&self, user_id: Uuid, title: &str, body: &str) -> anyhow::Result<SentPushInfo> {
    self.sent.lock().push((user_id, title.to_string(), body.to_string()));
    Ok(SentPushInfo {
      user_id,
      device_token: "recorded".to_string(),
      title: title.to_string(),
      message_id: format!("rec_{}", Uuid::new_v4()),
    })
  }
}

/// Sink whose transport is always down.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
  async fn send(&self, _user_id: Uuid, _title: &str, _body: &str) -> anyhow::Result<SentPushInfo> {
    Err(anyhow!("push gateway unreachable"))
  }
}

pub struct TestShop {
  pub store: Arc<MemoryStore>,
  pub state: AppState,
  pub admin: User,
  pub customer: User,
}

pub fn shop_with_sink(sink: Arc<dyn NotificationSink>) -> TestShop {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let admin = store.seed_user("admin", true, ADMIN_TOKEN);
  let customer = store.seed_user("customer", false, CUSTOMER_TOKEN);
  let repos = Repositories::from_store(store.clone());
  let config = AppConfig {
    storage_backend: StorageBackend::Memory,
    ..AppConfig::default()
  };
  let state = AppState::new(repos, Arc::new(config), sink).expect("flows register");
  TestShop {
    store,
    state,
    admin,
    customer,
  }
}

pub fn shop() -> (TestShop, Arc<RecordingSink>) {
  let sink = Arc::new(RecordingSink::default());
  (shop_with_sink(sink.clone()), sink)
}

pub async fn add_product(state: &AppState, title: &str, price_cents: i64, discount: Option<i64>, stock: i32) -> Product {
  state
    .repos
    .products
    .create(NewProduct {
      title: title.to_string(),
      description: None,
      price_cents,
      discount_price_cents: discount,
      category: "test".to_string(),
      stock,
    })
    .await
    .expect("product created")
}
