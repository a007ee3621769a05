// zahroshop/src/models/identity.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub username: String,
  pub is_admin: bool,
  pub created_at: DateTime<Utc>,
}

/// Push-notification target registered by a user's device.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DeviceToken {
  pub user_id: Uuid,
  pub token: String,
  pub updated_at: DateTime<Utc>,
}
