// zahroshop/src/pipelines/checkout_pipeline.rs

//! Cart-to-order materialization.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{cart_total_cents, Order};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::repo::NewOrderLine;
use crate::state::AppState;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use zahroflow::{Flow, FlowContext, FlowControl, FlowError, FlowRegistry, StageDef};

pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Flow::<CheckoutCtxData, AppError>::new(
    "checkout",
    [
      StageDef::required("load_cart_lines"),
      StageDef::required("price_order"),
      StageDef::required("persist_order"),
    ],
  );

  p.on("load_cart_lines", |ctx: FlowContext<CheckoutCtxData>| async move {
    let (user_id, carts) = {
      let guard = ctx.read();
      (guard.user_id, guard.app_state.repos.carts.clone())
    };
    let lines = carts.lines(user_id).await?;
    if lines.is_empty() {
      warn!(%user_id, "Checkout: cart is empty.");
      return Err(AppError::EmptyCart);
    }
    info!(%user_id, lines = lines.len(), "Checkout: cart lines loaded.");
    ctx.write().cart_lines = lines;
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  // Unit prices are snapshotted here; later catalog edits do not touch the order.
  p.on("price_order", |ctx: FlowContext<CheckoutCtxData>| async move {
    let (order_lines, total_price_cents) = {
      let guard = ctx.read();
      let order_lines: Vec<NewOrderLine> = guard
        .cart_lines
        .iter()
        .map(|line| NewOrderLine {
          product_id: line.product_id,
          quantity: line.quantity,
          unit_price_cents: line.unit_price_cents(),
        })
        .collect();
      (order_lines, cart_total_cents(&guard.cart_lines)?)
    };
    ctx.update(|data| {
      data.order_lines = order_lines;
      data.total_price_cents = total_price_cents;
    });
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  p.on("persist_order", |ctx: FlowContext<CheckoutCtxData>| async move {
    let (order, lines, consumed, orders) = {
      let guard = ctx.read();
      let order = Order::new_pending(
        guard.user_id,
        guard.address.clone(),
        guard.phone.clone(),
        guard.total_price_cents,
      );
      let consumed: Vec<Uuid> = guard.cart_lines.iter().map(|line| line.id).collect();
      (order, guard.order_lines.clone(), consumed, guard.app_state.repos.orders.clone())
    };
    orders.materialize(&order, &lines, &consumed).await?;
    info!(order_id = %order.id, total_price_cents = order.total_price_cents, "Checkout: order created.");
    ctx.write().order_id = Some(order.id);
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  registry.register(p);
  Ok(())
}

/// Turns the user's whole cart into a `pending` order. Returns the order id
/// and total.
#[instrument(name = "flow::checkout", skip(state, address, phone))]
pub async fn run_checkout(
  state: &AppState,
  user_id: Uuid,
  address: Option<String>,
  phone: Option<String>,
) -> AppResult<(Uuid, i64)> {
  let _cart_guard = state.cart_locks.acquire(user_id).await;
  let ctx = FlowContext::new(CheckoutCtxData {
    app_state: state.clone(),
    user_id,
    address: address.unwrap_or_default(),
    phone: phone.unwrap_or_default(),
    cart_lines: Vec::new(),
    order_lines: Vec::new(),
    total_price_cents: 0,
    order_id: None,
  });
  state.flows.run(ctx.clone()).await?;

  let guard = ctx.read();
  let order_id = guard
    .order_id
    .ok_or_else(|| AppError::Internal("Checkout completed without an order id.".to_string()))?;
  Ok((order_id, guard.total_price_cents))
}
