// zahroshop/src/services/push_mock.rs

//! Push-notification delivery.
//!
//! The transport is external; [`NotificationSink`] is the seam the lifecycle
//! flow dispatches through. [`MockPushSink`] stands in for a push gateway: it
//! resolves the user's device token, simulates latency and logs the message.

use crate::repo::DeviceRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SentPushInfo {
  pub user_id: Uuid,
  pub device_token: String,
  pub title: String,
  pub message_id: String,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
  async fn send(&self, user_id: Uuid, title: &str, body: &str) -> anyhow::Result<SentPushInfo>;
}

pub struct MockPushSink {
  devices: Arc<dyn DeviceRepository>,
  simulated_latency: Duration,
}

impl MockPushSink {
  pub fn new(devices: Arc<dyn DeviceRepository>, simulated_latency: Duration) -> Self {
    Self {
      devices,
      simulated_latency,
    }
  }
}

#[async_trait]
impl NotificationSink for MockPushSink {
  #[instrument(name = "push_mock::send", skip(self, body), fields(%user_id, title))]
  async fn send(&self, user_id: Uuid, title: &str, body: &str) -> anyhow::Result<SentPushInfo> {
    let device = self.devices.get(user_id).await?.ok_or_else(|| {
      warn!("No device token registered; push not delivered.");
      anyhow!("no device token registered for user {}", user_id)
    })?;

    info!("Simulating push delivery: Title='{}', Body='{}'", title, body);
    tokio::time::sleep(self.simulated_latency).await;

    let message_id = format!("mock_push_{}", Uuid::new_v4());
    info!("Mock push sent successfully. Message ID: {}", message_id);
    Ok(SentPushInfo {
      user_id,
      device_token: device.token,
      title: title.to_string(),
      message_id,
    })
  }
}
