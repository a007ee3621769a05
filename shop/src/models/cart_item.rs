// zahroshop/src/models/cart_item.rs

use super::product::effective_price_cents;
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// A cart line joined with the product fields needed for pricing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLine {
  pub id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub title: String,
  pub price_cents: i64,
  pub discount_price_cents: Option<i64>,
}

impl CartLine {
  pub fn unit_price_cents(&self) -> i64 {
    effective_price_cents(self.price_cents, self.discount_price_cents)
  }

  pub fn line_total_cents(&self) -> Result<i64> {
    self
      .unit_price_cents()
      .checked_mul(i64::from(self.quantity))
      .ok_or_else(|| AppError::Validation(format!("Cart line for '{}' exceeds the supported total.", self.title)))
  }
}

/// Sum of all line totals; `Validation` if it does not fit in an `i64`.
pub fn cart_total_cents(lines: &[CartLine]) -> Result<i64> {
  lines.iter().try_fold(0i64, |total, line| {
    total
      .checked_add(line.line_total_cents()?)
      .ok_or_else(|| AppError::Validation("Cart total exceeds the supported amount.".to_string()))
  })
}
