// zahroshop/src/models/product.rs

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Price a customer pays for one unit: the discount price when set and
/// non-zero, the base price otherwise.
pub fn effective_price_cents(price_cents: i64, discount_price_cents: Option<i64>) -> i64 {
  match discount_price_cents {
    Some(discount) if discount > 0 => discount,
    _ => price_cents,
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub title: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub discount_price_cents: Option<i64>,
  pub category: String,
  /// Signed: shipping may drive it below zero.
  pub stock: i32,
  pub created_at: DateTime<Utc>,
}

impl Product {
  pub fn effective_price_cents(&self) -> i64 {
    effective_price_cents(self.price_cents, self.discount_price_cents)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub title: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub discount_price_cents: Option<i64>,
  pub category: String,
  #[serde(default)]
  pub stock: i32,
}

impl NewProduct {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(AppError::Validation("Product title must not be empty.".to_string()));
    }
    if self.category.trim().is_empty() {
      return Err(AppError::Validation("Product category must not be empty.".to_string()));
    }
    validate_prices(Some(self.price_cents), self.discount_price_cents)?;
    validate_stock(Some(self.stock))
  }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub discount_price_cents: Option<i64>,
  /// Removes the discount so the base price applies again.
  #[serde(default)]
  pub clear_discount: bool,
  pub category: Option<String>,
  pub stock: Option<i32>,
}

impl ProductPatch {
  pub fn validate(&self) -> Result<()> {
    if matches!(&self.title, Some(t) if t.trim().is_empty()) {
      return Err(AppError::Validation("Product title must not be empty.".to_string()));
    }
    if matches!(&self.category, Some(c) if c.trim().is_empty()) {
      return Err(AppError::Validation("Product category must not be empty.".to_string()));
    }
    if self.clear_discount && self.discount_price_cents.is_some() {
      return Err(AppError::Validation(
        "discount_price_cents cannot be set while clear_discount is true.".to_string(),
      ));
    }
    validate_prices(self.price_cents, self.discount_price_cents)?;
    validate_stock(self.stock)
  }

  pub fn apply_to(self, product: &mut Product) {
    if let Some(title) = self.title {
      product.title = title;
    }
    if let Some(description) = self.description {
      product.description = Some(description);
    }
    if let Some(price) = self.price_cents {
      product.price_cents = price;
    }
    if self.clear_discount {
      product.discount_price_cents = None;
    } else if let Some(discount) = self.discount_price_cents {
      product.discount_price_cents = Some(discount);
    }
    if let Some(category) = self.category {
      product.category = category;
    }
    if let Some(stock) = self.stock {
      product.stock = stock;
    }
  }
}

fn validate_prices(price_cents: Option<i64>, discount_price_cents: Option<i64>) -> Result<()> {
  if price_cents.is_some_and(|p| p < 0) || discount_price_cents.is_some_and(|d| d < 0) {
    return Err(AppError::Validation("Prices must not be negative.".to_string()));
  }
  Ok(())
}

fn validate_stock(stock: Option<i32>) -> Result<()> {
  if stock.is_some_and(|s| s < 0) {
    return Err(AppError::Validation("Stock must not be negative.".to_string()));
  }
  Ok(())
}
