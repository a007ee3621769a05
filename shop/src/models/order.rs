// zahroshop/src/models/order.rs

use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, SqlxType)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  /// Shipped, delivered and cancelled orders fire no further automatic side
  /// effects, even if their status is changed again later.
  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Shipped | OrderStatus::Delivered | OrderStatus::Cancelled)
  }

  /// Human-readable label used in customer notifications.
  pub fn label(self) -> &'static str {
    match self {
      OrderStatus::Pending => "Pending",
      OrderStatus::Processing => "Processing",
      OrderStatus::Shipped => "Shipped",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::Cancelled => "Cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| AppError::InvalidStatus(s.to_string()))
  }
}

/// Whether the order has been paid. Kept apart from the fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "payment_state_enum", rename_all = "lowercase")]
pub enum PaymentState {
  Unpaid,
  Paid,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub address: String,
  pub phone: String,
  pub total_price_cents: i64,
  pub status: OrderStatus,
  pub payment_status: PaymentState,
  /// Set the first time the order enters a terminal status; never cleared.
  pub closed_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// A fresh `pending`, unpaid order.
  pub fn new_pending(user_id: Uuid, address: String, phone: String, total_price_cents: i64) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      user_id,
      address,
      phone,
      total_price_cents,
      status: OrderStatus::Pending,
      payment_status: PaymentState::Unpaid,
      closed_at: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn is_closed(&self) -> bool {
    self.closed_at.is_some()
  }

  /// Bonus points earned when this order ships: one point per ten whole
  /// currency units of the total.
  pub fn shipping_bonus(&self) -> i64 {
    self.total_price_cents.max(0) / 1000
  }
}
