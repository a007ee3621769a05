// zahroshop/src/pipelines/common_steps.rs

//! Fulfillment side effects run by the status-change flow once an order has
//! moved to a new status.

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::StatusChangeCtxData;
use crate::services::bonus_ledger;
use tracing::{info, instrument, warn};
use zahroflow::{FlowContext, FlowControl};

fn loaded_order(ctx: &FlowContext<StatusChangeCtxData>) -> AppResult<crate::models::Order> {
  ctx
    .read()
    .order
    .clone()
    .ok_or_else(|| AppError::Internal("Order missing from status-change context.".to_string()))
}

#[instrument(name = "common_step::decrement_stock", skip(ctx), err)]
pub async fn decrement_stock_step(ctx: FlowContext<StatusChangeCtxData>) -> AppResult<FlowControl> {
  let order = loaded_order(&ctx)?;
  let (orders, products) = {
    let guard = ctx.read();
    (guard.app_state.repos.orders.clone(), guard.app_state.repos.products.clone())
  };

  let items = orders.items(order.id).await?;
  let mut adjusted = 0;
  for item in &items {
    if products.adjust_stock(item.product_id, -item.quantity).await? {
      adjusted += 1;
    } else {
      warn!(product_id = %item.product_id, "Ordered product no longer exists; stock not adjusted.");
    }
  }
  info!(order_id = %order.id, lines = adjusted, "Stock decremented for shipped order.");
  ctx.write().stock_lines_adjusted = adjusted;
  Ok(FlowControl::Continue)
}

#[instrument(name = "common_step::accrue_bonus", skip(ctx), err)]
pub async fn accrue_bonus_step(ctx: FlowContext<StatusChangeCtxData>) -> AppResult<FlowControl> {
  let order = loaded_order(&ctx)?;
  let bonuses = ctx.read().app_state.repos.bonuses.clone();

  let points = order.shipping_bonus();
  let new_balance = bonus_ledger::accrue(bonuses.as_ref(), order.user_id, points).await?;
  info!(order_id = %order.id, user_id = %order.user_id, points, new_balance, "Shipping bonus credited.");
  ctx.write().bonus_accrued = points;
  Ok(FlowControl::Continue)
}

/// Empties the owner's whole cart, not only the lines the order came from.
#[instrument(name = "common_step::clear_cart", skip(ctx), err)]
pub async fn clear_cart_step(ctx: FlowContext<StatusChangeCtxData>) -> AppResult<FlowControl> {
  let order = loaded_order(&ctx)?;
  let (carts, cart_locks) = {
    let guard = ctx.read();
    (guard.app_state.repos.carts.clone(), guard.app_state.cart_locks.clone())
  };

  let _cart_guard = cart_locks.acquire(order.user_id).await;
  let cleared = carts.clear(order.user_id).await?;
  info!(user_id = %order.user_id, cleared, "Owner's cart cleared after shipping.");
  ctx.write().cart_lines_cleared = cleared;
  Ok(FlowControl::Continue)
}

#[instrument(name = "common_step::notify_customer", skip(ctx), err)]
pub async fn notify_customer_step(ctx: FlowContext<StatusChangeCtxData>) -> AppResult<FlowControl> {
  let order = loaded_order(&ctx)?;
  let (new_status, notifier) = {
    let guard = ctx.read();
    (guard.new_status, guard.app_state.notifier.clone())
  };
  let new_status =
    new_status.ok_or_else(|| AppError::Internal("Status missing from status-change context.".to_string()))?;

  let body = format!("Your order #{} is now: {}!", order.id, new_status.label());
  let sent = notifier.send(order.user_id, "Order update", &body).await?;
  info!(order_id = %order.id, message_id = %sent.message_id, "Customer notified of status change.");
  ctx.write().notification_sent = true;
  Ok(FlowControl::Continue)
}
