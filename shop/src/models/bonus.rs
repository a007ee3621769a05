// zahroshop/src/models/bonus.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BonusAccount {
  pub user_id: Uuid,
  pub balance: i64,
  pub updated_at: DateTime<Utc>,
}
