// zahroshop/src/repo/mod.rs

//! Storage traits, one per entity, and the bundle handed to `AppState`.
//!
//! Two implementations exist: [`PgStore`] over a `sqlx` PostgreSQL pool and
//! [`MemoryStore`] for tests and database-less development runs. Writes that
//! must not race are expressed as single conditional statements (upserts,
//! compare-and-set, guarded decrements) so both stores give the same
//! guarantees regardless of the locks held by callers.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::errors::Result;
use crate::models::{
  CartItem, CartLine, DeviceToken, NewProduct, Order, OrderItem, OrderStatus, Payment, PaymentStatus, Product,
  ProductPatch, User,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait ProductRepository: Send + Sync {
  /// All products ordered by title.
  async fn list(&self) -> Result<Vec<Product>>;
  async fn get(&self, id: Uuid) -> Result<Option<Product>>;
  async fn create(&self, input: NewProduct) -> Result<Product>;
  async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>>;
  /// `Ok(false)` when the product does not exist; `AppError::Conflict` when an
  /// order line still references it.
  async fn delete(&self, id: Uuid) -> Result<bool>;
  /// Adds `delta` to the stock in one atomic update. No lower bound;
  /// `Validation` if the result leaves the `i32` range.
  async fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<bool>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
  async fn lines(&self, user_id: Uuid) -> Result<Vec<CartLine>>;
  /// Creates the line or increments its quantity by `quantity`.
  /// `Validation` if the new quantity leaves the `i32` range.
  async fn add(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem>;
  async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;
  /// Deletes every line of the user's cart, returning how many were removed.
  async fn clear(&self, user_id: Uuid) -> Result<u64>;
}

/// Order line about to be persisted with its order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
  pub product_id: Uuid,
  pub quantity: i32,
  pub unit_price_cents: i64,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Persists `order` with `lines` and deletes the consumed cart lines, all or
  /// nothing.
  async fn materialize(&self, order: &Order, lines: &[NewOrderLine], consumed_cart_items: &[Uuid]) -> Result<()>;
  async fn create(&self, order: &Order) -> Result<()>;
  async fn get(&self, id: Uuid) -> Result<Option<Order>>;
  async fn get_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Order>>;
  /// Newest first.
  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>>;
  async fn items(&self, order_id: Uuid) -> Result<Vec<OrderItem>>;
  /// Compare-and-set on the status and the closed marker. `Ok(false)` when
  /// the stored status is no longer `from` or the order's closed state no
  /// longer matches `was_closed`. Entering a terminal status stamps
  /// `closed_at` unless it is already set.
  async fn transition_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus, was_closed: bool) -> Result<bool>;
  async fn mark_paid(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait BonusRepository: Send + Sync {
  /// Zero for users without an account.
  async fn balance(&self, user_id: Uuid) -> Result<i64>;
  /// Adds `amount`, creating the account on first accrual. Returns the new balance.
  async fn accrue(&self, user_id: Uuid, amount: i64) -> Result<i64>;
  /// Subtracts `amount` only if the balance covers it; `Ok(None)` otherwise.
  async fn debit(&self, user_id: Uuid, amount: i64) -> Result<Option<i64>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
  async fn get_for_order(&self, order_id: Uuid) -> Result<Option<Payment>>;
  /// Inserts a payment unless the order already has one; `Ok(None)` in that case.
  async fn create_if_absent(&self, order_id: Uuid, method: &str, status: PaymentStatus) -> Result<Option<Payment>>;
}

#[async_trait]
pub trait DeviceRepository: Send + Sync {
  async fn upsert(&self, user_id: Uuid, token: &str) -> Result<DeviceToken>;
  async fn get(&self, user_id: Uuid) -> Result<Option<DeviceToken>>;
}

#[async_trait]
pub trait IdentityRepository: Send + Sync {
  async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>>;
}

/// Every repository the service uses, shared behind trait objects.
#[derive(Clone)]
pub struct Repositories {
  pub products: Arc<dyn ProductRepository>,
  pub carts: Arc<dyn CartRepository>,
  pub orders: Arc<dyn OrderRepository>,
  pub bonuses: Arc<dyn BonusRepository>,
  pub payments: Arc<dyn PaymentRepository>,
  pub devices: Arc<dyn DeviceRepository>,
  pub identities: Arc<dyn IdentityRepository>,
}

impl Repositories {
  /// Uses one store for every entity.
  pub fn from_store<S>(store: Arc<S>) -> Self
  where
    S: ProductRepository
      + CartRepository
      + OrderRepository
      + BonusRepository
      + PaymentRepository
      + DeviceRepository
      + IdentityRepository
      + 'static,
  {
    Self {
      products: store.clone(),
      carts: store.clone(),
      orders: store.clone(),
      bonuses: store.clone(),
      payments: store.clone(),
      devices: store.clone(),
      identities: store,
    }
  }
}
