// zahroshop/src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_status_enum", rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
}

/// At most one per order.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
  pub id: Uuid,
  pub order_id: Uuid,
  pub method: String,
  pub status: PaymentStatus,
  pub created_at: DateTime<Utc>,
}
