// zahroshop/src/pipelines/contexts.rs

//! Data structs the flows run on. Handlers receive them wrapped in
//! `zahroflow::FlowContext`; the registry dispatches on their type.

use crate::models::{CartItem, CartLine, Order, OrderStatus, Payment};
use crate::repo::NewOrderLine;
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub product_id: Uuid,
  /// Defaults to 1 when absent.
  pub quantity: Option<i32>,
  pub updated_cart_item: Option<CartItem>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub address: String,
  pub phone: String,
  pub cart_lines: Vec<CartLine>,
  pub order_lines: Vec<NewOrderLine>,
  pub total_price_cents: i64,
  pub order_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct StatusChangeCtxData {
  pub app_state: AppState,
  pub order_id: Uuid,
  pub requested_status: String,
  pub order: Option<Order>,
  pub previous_status: Option<OrderStatus>,
  pub new_status: Option<OrderStatus>,
  /// Whether the order had already reached a terminal status before this run.
  pub was_closed: bool,
  pub changed: bool,
  pub stock_lines_adjusted: usize,
  pub bonus_accrued: i64,
  pub cart_lines_cleared: u64,
  pub notification_sent: bool,
}

impl std::fmt::Debug for StatusChangeCtxData {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StatusChangeCtxData")
      .field("order_id", &self.order_id)
      .field("requested_status", &self.requested_status)
      .field("order", &self.order)
      .field("previous_status", &self.previous_status)
      .field("new_status", &self.new_status)
      .field("was_closed", &self.was_closed)
      .field("changed", &self.changed)
      .field("stock_lines_adjusted", &self.stock_lines_adjusted)
      .field("bonus_accrued", &self.bonus_accrued)
      .field("cart_lines_cleared", &self.cart_lines_cleared)
      .field("notification_sent", &self.notification_sent)
      .finish_non_exhaustive()
  }
}

impl StatusChangeCtxData {
  pub fn new(app_state: AppState, order_id: Uuid, requested_status: String) -> Self {
    Self {
      app_state,
      order_id,
      requested_status,
      order: None,
      previous_status: None,
      new_status: None,
      was_closed: false,
      changed: false,
      stock_lines_adjusted: 0,
      bonus_accrued: 0,
      cart_lines_cleared: 0,
      notification_sent: false,
    }
  }

  /// A change on an order that was never closed; closed orders stay quiet.
  pub fn fires_side_effects(&self) -> bool {
    self.changed && !self.was_closed
  }

  /// True when this run is the order's first move into a terminal status
  /// and that status is `shipped`.
  pub fn ships(&self) -> bool {
    self.fires_side_effects() && self.new_status == Some(OrderStatus::Shipped)
  }
}

#[derive(Clone)]
pub struct PaymentCtxData {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub order_id: Uuid,
  pub payment_method: String,
  pub order: Option<Order>,
  pub payment: Option<Payment>,
  pub payment_link: Option<String>,
}

impl std::fmt::Debug for PaymentCtxData {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PaymentCtxData")
      .field("user_id", &self.user_id)
      .field("order_id", &self.order_id)
      .field("payment_method", &self.payment_method)
      .field("order", &self.order)
      .field("payment", &self.payment)
      .field("payment_link", &self.payment_link)
      .finish_non_exhaustive()
  }
}
