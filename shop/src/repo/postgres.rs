// zahroshop/src/repo/postgres.rs

//! PostgreSQL-backed repositories using runtime `sqlx` queries.
//! The schema lives in `schema.sql` at the crate root.

use super::{
  BonusRepository, CartRepository, DeviceRepository, IdentityRepository, NewOrderLine, OrderRepository,
  PaymentRepository, ProductRepository,
};
use crate::errors::{AppError, Result};
use crate::models::{
  CartItem, CartLine, DeviceToken, NewProduct, Order, OrderItem, OrderStatus, Payment, PaymentState, PaymentStatus,
  Product, ProductPatch, User,
};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, title, description, price_cents, discount_price_cents, category, stock, created_at";
const ORDER_COLUMNS: &str =
  "id, user_id, address, phone, total_price_cents, status, payment_status, closed_at, created_at, updated_at";

// Postgres SQLSTATEs.
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Maps an integer overflow inside an arithmetic UPDATE to `Validation`.
fn out_of_range(e: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
  match e {
    sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) => {
      AppError::Validation(message())
    }
    other => AppError::Sqlx(other),
  }
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await
      .map_err(|e| {
        error!(error = %e, "Failed to connect to the database.");
        AppError::Sqlx(e)
      })?;
    info!(max_connections, "Successfully connected to the database.");
    Ok(Self::new(pool))
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl ProductRepository for PgStore {
  async fn list(&self) -> Result<Vec<Product>> {
    let products = sqlx::query_as(&format!("SELECT {} FROM products ORDER BY title ASC", PRODUCT_COLUMNS))
      .fetch_all(&self.pool)
      .await?;
    Ok(products)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(product)
  }

  #[instrument(name = "pg::create_product", skip(self, input), fields(title = %input.title), err)]
  async fn create(&self, input: NewProduct) -> Result<Product> {
    let product = sqlx::query_as(&format!(
      "INSERT INTO products (id, title, description, price_cents, discount_price_cents, category, stock, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.price_cents)
    .bind(input.discount_price_cents)
    .bind(&input.category)
    .bind(input.stock)
    .fetch_one(&self.pool)
    .await?;
    Ok(product)
  }

  #[instrument(name = "pg::update_product", skip(self, patch), err)]
  async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>> {
    let product = sqlx::query_as(&format!(
      "UPDATE products SET \
         title = COALESCE($2, title), \
         description = COALESCE($3, description), \
         price_cents = COALESCE($4, price_cents), \
         discount_price_cents = CASE WHEN $8 THEN NULL ELSE COALESCE($5, discount_price_cents) END, \
         category = COALESCE($6, category), \
         stock = COALESCE($7, stock) \
       WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .bind(patch.title)
    .bind(patch.description)
    .bind(patch.price_cents)
    .bind(patch.discount_price_cents)
    .bind(patch.category)
    .bind(patch.stock)
    .bind(patch.clear_discount)
    .fetch_optional(&self.pool)
    .await?;
    Ok(product)
  }

  #[instrument(name = "pg::delete_product", skip(self), err)]
  async fn delete(&self, id: Uuid) -> Result<bool> {
    match sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
    {
      Ok(done) => Ok(done.rows_affected() > 0),
      Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => Err(
        AppError::Conflict(format!("Product {} is referenced by existing orders.", id)),
      ),
      Err(e) => Err(AppError::Sqlx(e)),
    }
  }

  async fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<bool> {
    let done = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
      .bind(id)
      .bind(delta)
      .execute(&self.pool)
      .await
      .map_err(|e| out_of_range(e, || format!("Stock of product {} is out of range.", id)))?;
    Ok(done.rows_affected() > 0)
  }
}

#[async_trait]
impl CartRepository for PgStore {
  async fn lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let lines = sqlx::query_as(
      "SELECT c.id, c.product_id, c.quantity, p.title, p.price_cents, p.discount_price_cents \
       FROM cart_items c JOIN products p ON p.id = c.product_id \
       WHERE c.user_id = $1 ORDER BY c.added_at ASC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(lines)
  }

  async fn add(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let item = sqlx::query_as(
      "INSERT INTO cart_items (id, user_id, product_id, quantity, added_at) \
       VALUES ($1, $2, $3, $4, NOW()) \
       ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
       RETURNING id, user_id, product_id, quantity, added_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| out_of_range(e, || "Cart quantity is out of range.".to_string()))?;
    Ok(item)
  }

  async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let done = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await?;
    Ok(done.rows_affected() > 0)
  }

  async fn clear(&self, user_id: Uuid) -> Result<u64> {
    let done = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(done.rows_affected())
  }
}

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(name = "pg::materialize_order", skip_all, fields(order_id = %order.id, lines = lines.len()), err)]
  async fn materialize(&self, order: &Order, lines: &[NewOrderLine], consumed_cart_items: &[Uuid]) -> Result<()> {
    let mut tx = self.pool.begin().await?;

    insert_order(&mut *tx, order).await?;
    for line in lines {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents) VALUES ($1, $2, $3, $4, $5)",
      )
      .bind(Uuid::new_v4())
      .bind(order.id)
      .bind(line.product_id)
      .bind(line.quantity)
      .bind(line.unit_price_cents)
      .execute(&mut *tx)
      .await?;
    }
    let deleted = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = ANY($2)")
      .bind(order.user_id)
      .bind(consumed_cart_items)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    debug!(cart_lines_deleted = deleted.rows_affected(), "Order materialized.");
    Ok(())
  }

  async fn create(&self, order: &Order) -> Result<()> {
    insert_order(&self.pool, order).await
  }

  async fn get(&self, id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(order)
  }

  async fn get_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE id = $1 AND user_id = $2",
      ORDER_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(order)
  }

  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
    let orders = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
  }

  async fn items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as(
      "SELECT id, order_id, product_id, quantity, unit_price_cents FROM order_items WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(items)
  }

  #[instrument(name = "pg::transition_status", skip(self), err)]
  async fn transition_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus, was_closed: bool) -> Result<bool> {
    let done = sqlx::query(
      "UPDATE orders SET status = $3, updated_at = NOW(), \
         closed_at = CASE WHEN $5 THEN COALESCE(closed_at, NOW()) ELSE closed_at END \
       WHERE id = $1 AND status = $2 AND (closed_at IS NOT NULL) = $4",
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .bind(was_closed)
    .bind(to.is_terminal())
    .execute(&self.pool)
    .await?;
    Ok(done.rows_affected() == 1)
  }

  async fn mark_paid(&self, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE orders SET payment_status = $2, updated_at = NOW() WHERE id = $1")
      .bind(id)
      .bind(PaymentState::Paid)
      .execute(&self.pool)
      .await?;
    Ok(())
  }
}

async fn insert_order<'e, E>(executor: E, order: &Order) -> Result<()>
where
  E: sqlx::PgExecutor<'e>,
{
  sqlx::query(
    "INSERT INTO orders (id, user_id, address, phone, total_price_cents, status, payment_status, closed_at, \
       created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
  )
  .bind(order.id)
  .bind(order.user_id)
  .bind(&order.address)
  .bind(&order.phone)
  .bind(order.total_price_cents)
  .bind(order.status)
  .bind(order.payment_status)
  .bind(order.closed_at)
  .bind(order.created_at)
  .bind(order.updated_at)
  .execute(executor)
  .await?;
  Ok(())
}

#[async_trait]
impl BonusRepository for PgStore {
  async fn balance(&self, user_id: Uuid) -> Result<i64> {
    let balance: Option<i64> = sqlx::query_scalar("SELECT balance FROM bonus_accounts WHERE user_id = $1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(balance.unwrap_or(0))
  }

  async fn accrue(&self, user_id: Uuid, amount: i64) -> Result<i64> {
    let balance = sqlx::query_scalar(
      "INSERT INTO bonus_accounts (user_id, balance, updated_at) VALUES ($1, $2, NOW()) \
       ON CONFLICT (user_id) DO UPDATE SET balance = bonus_accounts.balance + EXCLUDED.balance, updated_at = NOW() \
       RETURNING balance",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| out_of_range(e, || "Bonus balance is out of range.".to_string()))?;
    Ok(balance)
  }

  async fn debit(&self, user_id: Uuid, amount: i64) -> Result<Option<i64>> {
    let balance = sqlx::query_scalar(
      "UPDATE bonus_accounts SET balance = balance - $2, updated_at = NOW() \
       WHERE user_id = $1 AND balance >= $2 RETURNING balance",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(&self.pool)
    .await?;
    Ok(balance)
  }
}

#[async_trait]
impl PaymentRepository for PgStore {
  async fn get_for_order(&self, order_id: Uuid) -> Result<Option<Payment>> {
    let payment = sqlx::query_as("SELECT id, order_id, method, status, created_at FROM payments WHERE order_id = $1")
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(payment)
  }

  async fn create_if_absent(&self, order_id: Uuid, method: &str, status: PaymentStatus) -> Result<Option<Payment>> {
    let payment = sqlx::query_as(
      "INSERT INTO payments (id, order_id, method, status, created_at) VALUES ($1, $2, $3, $4, NOW()) \
       ON CONFLICT (order_id) DO NOTHING \
       RETURNING id, order_id, method, status, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(method)
    .bind(status)
    .fetch_optional(&self.pool)
    .await?;
    Ok(payment)
  }
}

#[async_trait]
impl DeviceRepository for PgStore {
  async fn upsert(&self, user_id: Uuid, token: &str) -> Result<DeviceToken> {
    let device = sqlx::query_as(
      "INSERT INTO device_tokens (user_id, token, updated_at) VALUES ($1, $2, NOW()) \
       ON CONFLICT (user_id) DO UPDATE SET token = EXCLUDED.token, updated_at = NOW() \
       RETURNING user_id, token, updated_at",
    )
    .bind(user_id)
    .bind(token)
    .fetch_one(&self.pool)
    .await?;
    Ok(device)
  }

  async fn get(&self, user_id: Uuid) -> Result<Option<DeviceToken>> {
    let device = sqlx::query_as("SELECT user_id, token, updated_at FROM device_tokens WHERE user_id = $1")
      .bind(user_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(device)
  }
}

#[async_trait]
impl IdentityRepository for PgStore {
  async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
    let user = sqlx::query_as(
      "SELECT u.id, u.username, u.is_admin, u.created_at \
       FROM api_tokens t JOIN users u ON u.id = t.user_id \
       WHERE t.token_hash = $1",
    )
    .bind(token_hash)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }
}
