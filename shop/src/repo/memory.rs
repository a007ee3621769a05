// zahroshop/src/repo/memory.rs

//! In-process store implementing every repository trait.
//!
//! All tables sit behind one `parking_lot::Mutex`, so each trait method is a
//! single critical section. That gives the same atomicity the PostgreSQL
//! statements provide (upsert increments, status compare-and-set, guarded
//! debits, all-or-nothing materialization).

use super::{
  BonusRepository, CartRepository, DeviceRepository, IdentityRepository, NewOrderLine, OrderRepository,
  PaymentRepository, ProductRepository,
};
use crate::errors::{AppError, Result};
use crate::models::{
  BonusAccount, CartItem, CartLine, DeviceToken, NewProduct, Order, OrderItem, OrderStatus, Payment, PaymentState,
  PaymentStatus, Product, ProductPatch, User,
};
use crate::services::auth_service::hash_token;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  users: HashMap<Uuid, User>,
  api_tokens: HashMap<String, Uuid>,
  products: HashMap<Uuid, Product>,
  cart_items: Vec<CartItem>,
  orders: HashMap<Uuid, Order>,
  order_items: Vec<OrderItem>,
  bonus_accounts: HashMap<Uuid, BonusAccount>,
  payments: HashMap<Uuid, Payment>,
  device_tokens: HashMap<Uuid, DeviceToken>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a user reachable through the bearer token `raw_token`.
  pub fn seed_user(&self, username: &str, is_admin: bool, raw_token: &str) -> User {
    let user = User {
      id: Uuid::new_v4(),
      username: username.to_string(),
      is_admin,
      created_at: Utc::now(),
    };
    let mut tables = self.tables.lock();
    tables.api_tokens.insert(hash_token(raw_token), user.id);
    tables.users.insert(user.id, user.clone());
    debug!(user_id = %user.id, username, is_admin, "Seeded in-memory user.");
    user
  }
}

#[async_trait]
impl ProductRepository for MemoryStore {
  async fn list(&self) -> Result<Vec<Product>> {
    let mut products: Vec<Product> = self.tables.lock().products.values().cloned().collect();
    products.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(products)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.get(&id).cloned())
  }

  async fn create(&self, input: NewProduct) -> Result<Product> {
    let product = Product {
      id: Uuid::new_v4(),
      title: input.title,
      description: input.description,
      price_cents: input.price_cents,
      discount_price_cents: input.discount_price_cents,
      category: input.category,
      stock: input.stock,
      created_at: Utc::now(),
    };
    self.tables.lock().products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
    let mut tables = self.tables.lock();
    Ok(tables.products.get_mut(&id).map(|product| {
      patch.apply_to(product);
      product.clone()
    }))
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    if !tables.products.contains_key(&id) {
      return Ok(false);
    }
    if tables.order_items.iter().any(|item| item.product_id == id) {
      return Err(AppError::Conflict(format!(
        "Product {} is referenced by existing orders.",
        id
      )));
    }
    tables.products.remove(&id);
    tables.cart_items.retain(|item| item.product_id != id);
    Ok(true)
  }

  async fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<bool> {
    let mut tables = self.tables.lock();
    match tables.products.get_mut(&id) {
      Some(product) => {
        product.stock = product
          .stock
          .checked_add(delta)
          .ok_or_else(|| AppError::Validation(format!("Stock of product {} is out of range.", id)))?;
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

#[async_trait]
impl CartRepository for MemoryStore {
  async fn lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let tables = self.tables.lock();
    let lines = tables
      .cart_items
      .iter()
      .filter(|item| item.user_id == user_id)
      .filter_map(|item| {
        tables.products.get(&item.product_id).map(|product| CartLine {
          id: item.id,
          product_id: item.product_id,
          quantity: item.quantity,
          title: product.title.clone(),
          price_cents: product.price_cents,
          discount_price_cents: product.discount_price_cents,
        })
      })
      .collect();
    Ok(lines)
  }

  async fn add(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let mut tables = self.tables.lock();
    if let Some(existing) = tables
      .cart_items
      .iter_mut()
      .find(|item| item.user_id == user_id && item.product_id == product_id)
    {
      existing.quantity = existing
        .quantity
        .checked_add(quantity)
        .ok_or_else(|| AppError::Validation("Cart quantity is out of range.".to_string()))?;
      return Ok(existing.clone());
    }
    let item = CartItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
      added_at: Utc::now(),
    };
    tables.cart_items.push(item.clone());
    Ok(item)
  }

  async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let before = tables.cart_items.len();
    tables
      .cart_items
      .retain(|item| !(item.user_id == user_id && item.product_id == product_id));
    Ok(tables.cart_items.len() < before)
  }

  async fn clear(&self, user_id: Uuid) -> Result<u64> {
    let mut tables = self.tables.lock();
    let before = tables.cart_items.len();
    tables.cart_items.retain(|item| item.user_id != user_id);
    Ok((before - tables.cart_items.len()) as u64)
  }
}

#[async_trait]
impl OrderRepository for MemoryStore {
  async fn materialize(&self, order: &Order, lines: &[NewOrderLine], consumed_cart_items: &[Uuid]) -> Result<()> {
    let mut tables = self.tables.lock();
    if tables.orders.contains_key(&order.id) {
      return Err(AppError::Conflict(format!("Order {} already exists.", order.id)));
    }
    tables.orders.insert(order.id, order.clone());
    tables.order_items.extend(lines.iter().map(|line| OrderItem {
      id: Uuid::new_v4(),
      order_id: order.id,
      product_id: line.product_id,
      quantity: line.quantity,
      unit_price_cents: line.unit_price_cents,
    }));
    tables
      .cart_items
      .retain(|item| !(item.user_id == order.user_id && consumed_cart_items.contains(&item.id)));
    Ok(())
  }

  async fn create(&self, order: &Order) -> Result<()> {
    let mut tables = self.tables.lock();
    if tables.orders.contains_key(&order.id) {
      return Err(AppError::Conflict(format!("Order {} already exists.", order.id)));
    }
    tables.orders.insert(order.id, order.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.get(&id).cloned())
  }

  async fn get_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Order>> {
    Ok(
      self
        .tables
        .lock()
        .orders
        .get(&id)
        .filter(|order| order.user_id == user_id)
        .cloned(),
    )
  }

  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .tables
      .lock()
      .orders
      .values()
      .filter(|order| order.user_id == user_id)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    Ok(
      self
        .tables
        .lock()
        .order_items
        .iter()
        .filter(|item| item.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn transition_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus, was_closed: bool) -> Result<bool> {
    let mut tables = self.tables.lock();
    match tables.orders.get_mut(&id) {
      Some(order) if order.status == from && order.is_closed() == was_closed => {
        let now = Utc::now();
        order.status = to;
        order.updated_at = now;
        if to.is_terminal() && order.closed_at.is_none() {
          order.closed_at = Some(now);
        }
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn mark_paid(&self, id: Uuid) -> Result<()> {
    if let Some(order) = self.tables.lock().orders.get_mut(&id) {
      order.payment_status = PaymentState::Paid;
      order.updated_at = Utc::now();
    }
    Ok(())
  }
}

#[async_trait]
impl BonusRepository for MemoryStore {
  async fn balance(&self, user_id: Uuid) -> Result<i64> {
    Ok(
      self
        .tables
        .lock()
        .bonus_accounts
        .get(&user_id)
        .map_or(0, |account| account.balance),
    )
  }

  async fn accrue(&self, user_id: Uuid, amount: i64) -> Result<i64> {
    let mut tables = self.tables.lock();
    let account = tables.bonus_accounts.entry(user_id).or_insert_with(|| BonusAccount {
      user_id,
      balance: 0,
      updated_at: Utc::now(),
    });
    account.balance = account
      .balance
      .checked_add(amount)
      .ok_or_else(|| AppError::Validation("Bonus balance is out of range.".to_string()))?;
    account.updated_at = Utc::now();
    Ok(account.balance)
  }

  async fn debit(&self, user_id: Uuid, amount: i64) -> Result<Option<i64>> {
    let mut tables = self.tables.lock();
    match tables.bonus_accounts.get_mut(&user_id) {
      Some(account) if account.balance >= amount => {
        account.balance -= amount;
        account.updated_at = Utc::now();
        Ok(Some(account.balance))
      }
      _ => Ok(None),
    }
  }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
  async fn get_for_order(&self, order_id: Uuid) -> Result<Option<Payment>> {
    Ok(self.tables.lock().payments.get(&order_id).cloned())
  }

  async fn create_if_absent(&self, order_id: Uuid, method: &str, status: PaymentStatus) -> Result<Option<Payment>> {
    let mut tables = self.tables.lock();
    if tables.payments.contains_key(&order_id) {
      return Ok(None);
    }
    let payment = Payment {
      id: Uuid::new_v4(),
      order_id,
      method: method.to_string(),
      status,
      created_at: Utc::now(),
    };
    tables.payments.insert(order_id, payment.clone());
    Ok(Some(payment))
  }
}

#[async_trait]
impl DeviceRepository for MemoryStore {
  async fn upsert(&self, user_id: Uuid, token: &str) -> Result<DeviceToken> {
    let device = DeviceToken {
      user_id,
      token: token.to_string(),
      updated_at: Utc::now(),
    };
    self.tables.lock().device_tokens.insert(user_id, device.clone());
    Ok(device)
  }

  async fn get(&self, user_id: Uuid) -> Result<Option<DeviceToken>> {
    Ok(self.tables.lock().device_tokens.get(&user_id).cloned())
  }
}

#[async_trait]
impl IdentityRepository for MemoryStore {
  async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
    let tables = self.tables.lock();
    Ok(
      tables
        .api_tokens
        .get(token_hash)
        .and_then(|user_id| tables.users.get(user_id))
        .cloned(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_product(title: &str, price_cents: i64) -> NewProduct {
    NewProduct {
      title: title.to_string(),
      description: None,
      price_cents,
      discount_price_cents: None,
      category: "general".to_string(),
      stock: 10,
    }
  }

  #[tokio::test]
  async fn cart_add_increments_existing_line() {
    let store = MemoryStore::new();
    let product = ProductRepository::create(&store, new_product("Tea", 100)).await.unwrap();
    let user = Uuid::new_v4();

    let first = store.add(user, product.id, 2).await.unwrap();
    let second = store.add(user, product.id, 3).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity, 5);
    assert_eq!(store.lines(user).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn status_compare_and_set_rejects_stale_source() {
    let store = MemoryStore::new();
    let order = Order::new_pending(Uuid::new_v4(), "addr".into(), String::new(), 100);
    OrderRepository::create(&store, &order).await.unwrap();

    assert!(store
      .transition_status(order.id, OrderStatus::Pending, OrderStatus::Shipped, false)
      .await
      .unwrap());
    assert!(!store
      .transition_status(order.id, OrderStatus::Pending, OrderStatus::Shipped, false)
      .await
      .unwrap());
  }

  #[tokio::test]
  async fn first_terminal_status_closes_the_order() {
    let store = MemoryStore::new();
    let order = Order::new_pending(Uuid::new_v4(), "addr".into(), String::new(), 100);
    OrderRepository::create(&store, &order).await.unwrap();

    store
      .transition_status(order.id, OrderStatus::Pending, OrderStatus::Processing, false)
      .await
      .unwrap();
    assert!(!OrderRepository::get(&store, order.id).await.unwrap().unwrap().is_closed());

    store
      .transition_status(order.id, OrderStatus::Processing, OrderStatus::Cancelled, false)
      .await
      .unwrap();
    let closed_at = OrderRepository::get(&store, order.id).await.unwrap().unwrap().closed_at;
    assert!(closed_at.is_some());

    // Reopening keeps the marker, and a stale closed flag loses the race.
    assert!(!store
      .transition_status(order.id, OrderStatus::Cancelled, OrderStatus::Pending, false)
      .await
      .unwrap());
    assert!(store
      .transition_status(order.id, OrderStatus::Cancelled, OrderStatus::Pending, true)
      .await
      .unwrap());
    let reopened = OrderRepository::get(&store, order.id).await.unwrap().unwrap();
    assert_eq!(reopened.status, OrderStatus::Pending);
    assert_eq!(reopened.closed_at, closed_at);
  }

  #[tokio::test]
  async fn cart_quantity_overflow_is_rejected() {
    let store = MemoryStore::new();
    let product = ProductRepository::create(&store, new_product("Tea", 100)).await.unwrap();
    let user = Uuid::new_v4();

    store.add(user, product.id, i32::MAX).await.unwrap();
    assert!(matches!(store.add(user, product.id, 1).await, Err(AppError::Validation(_))));
    assert_eq!(store.lines(user).await.unwrap()[0].quantity, i32::MAX);
  }

  #[tokio::test]
  async fn debit_never_goes_negative() {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    assert_eq!(store.debit(user, 1).await.unwrap(), None);
    store.accrue(user, 5).await.unwrap();
    assert_eq!(store.debit(user, 6).await.unwrap(), None);
    assert_eq!(store.debit(user, 5).await.unwrap(), Some(0));
    assert_eq!(store.balance(user).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn referenced_product_cannot_be_deleted() {
    let store = MemoryStore::new();
    let product = ProductRepository::create(&store, new_product("Mug", 500)).await.unwrap();
    let order = Order::new_pending(Uuid::new_v4(), String::new(), String::new(), 500);
    let line = NewOrderLine {
      product_id: product.id,
      quantity: 1,
      unit_price_cents: 500,
    };
    store.materialize(&order, &[line], &[]).await.unwrap();

    assert!(matches!(
      ProductRepository::delete(&store, product.id).await,
      Err(AppError::Conflict(_))
    ));
    assert!(!ProductRepository::delete(&store, Uuid::new_v4()).await.unwrap());
  }

  #[tokio::test]
  async fn second_payment_is_not_created() {
    let store = MemoryStore::new();
    let order_id = Uuid::new_v4();
    assert!(store
      .create_if_absent(order_id, "card", PaymentStatus::Paid)
      .await
      .unwrap()
      .is_some());
    assert!(store
      .create_if_absent(order_id, "cash", PaymentStatus::Paid)
      .await
      .unwrap()
      .is_none());
    assert_eq!(store.get_for_order(order_id).await.unwrap().unwrap().method, "card");
  }

  #[tokio::test]
  async fn seeded_token_resolves_to_user() {
    let store = MemoryStore::new();
    let user = store.seed_user("admin", true, "secret");
    let found = store.find_by_token_hash(&hash_token("secret")).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert!(store.find_by_token_hash(&hash_token("other")).await.unwrap().is_none());
  }
}
