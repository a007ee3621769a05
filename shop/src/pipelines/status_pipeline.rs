// zahroshop/src/pipelines/status_pipeline.rs

//! Order status transitions and the side effects they trigger.
//!
//! The flow loads the order, parses the requested status and applies it with
//! a compare-and-set. An unchanged status halts the run, so nothing below
//! `apply_status` repeats. The first move into a terminal status (shipped,
//! delivered or cancelled) closes the order for side effects. Later changes
//! are still persisted but fire nothing, not even a notification.
//!
//! Shipping an open order decrements stock, accrues the shipping bonus and
//! clears the owner's cart. Changes on open orders notify the customer on a
//! best-effort basis.

use crate::errors::{AppError, Result as AppResult};
use crate::models::OrderStatus;
use crate::pipelines::common_steps::{accrue_bonus_step, clear_cart_step, decrement_stock_step, notify_customer_step};
use crate::pipelines::contexts::StatusChangeCtxData;
use crate::state::AppState;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use zahroflow::{Flow, FlowContext, FlowControl, FlowError, FlowRegistry, StageDef};

fn not_shipping(data: &StatusChangeCtxData) -> bool {
  !data.ships()
}

fn quiet(data: &StatusChangeCtxData) -> bool {
  !data.fires_side_effects()
}

pub fn register_status_change_pipeline(registry: &FlowRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Flow::<StatusChangeCtxData, AppError>::new(
    "order_status_change",
    [
      StageDef::required("load_order"),
      StageDef::required("parse_target_status"),
      StageDef::required("apply_status"),
      StageDef::required("decrement_stock").skip_if(not_shipping),
      StageDef::required("accrue_bonus").skip_if(not_shipping),
      StageDef::required("clear_cart").skip_if(not_shipping),
      StageDef::required("notify_customer").best_effort().skip_if(quiet),
    ],
  );

  p.on("load_order", |ctx: FlowContext<StatusChangeCtxData>| async move {
    let (order_id, orders) = {
      let guard = ctx.read();
      (guard.order_id, guard.app_state.repos.orders.clone())
    };
    let order = orders
      .get(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;
    ctx.update(|data| {
      data.previous_status = Some(order.status);
      data.was_closed = order.is_closed();
      data.order = Some(order);
    });
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  p.on("parse_target_status", |ctx: FlowContext<StatusChangeCtxData>| async move {
    let requested = ctx.read().requested_status.clone();
    let status: OrderStatus = requested.parse()?;
    ctx.write().new_status = Some(status);
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  p.on("apply_status", |ctx: FlowContext<StatusChangeCtxData>| async move {
    let (order_id, from, to, was_closed, orders) = {
      let guard = ctx.read();
      (
        guard.order_id,
        guard.previous_status,
        guard.new_status,
        guard.was_closed,
        guard.app_state.repos.orders.clone(),
      )
    };
    let (Some(from), Some(to)) = (from, to) else {
      return Err(AppError::Internal("Status transition inputs missing.".to_string()));
    };

    if from == to {
      info!(%order_id, status = %to, "Status unchanged; no side effects.");
      return Ok(FlowControl::Halt);
    }
    if !orders.transition_status(order_id, from, to, was_closed).await? {
      warn!(%order_id, %from, %to, "Order status changed concurrently.");
      return Err(AppError::Conflict(format!(
        "Order {} was modified concurrently; retry the status change.",
        order_id
      )));
    }

    info!(%order_id, %from, %to, was_closed, "Order status changed.");
    ctx.update(|data| {
      data.changed = true;
      if let Some(order) = data.order.as_mut() {
        order.status = to;
        if to.is_terminal() && order.closed_at.is_none() {
          order.closed_at = Some(Utc::now());
        }
      }
    });
    Ok(FlowControl::Continue)
  })?;

  p.on("decrement_stock", decrement_stock_step)?;
  p.on("accrue_bonus", accrue_bonus_step)?;
  p.on("clear_cart", clear_cart_step)?;
  p.on("notify_customer", notify_customer_step)?;

  registry.register(p);
  Ok(())
}

/// Moves an order to `requested_status` under the order's lock and returns
/// the final flow data.
#[instrument(name = "flow::status_change", skip(state))]
pub async fn run_status_change(
  state: &AppState,
  order_id: Uuid,
  requested_status: String,
) -> AppResult<StatusChangeCtxData> {
  let _order_guard = state.order_locks.acquire(order_id).await;
  let ctx = FlowContext::new(StatusChangeCtxData::new(state.clone(), order_id, requested_status));
  state.flows.run(ctx.clone()).await?;
  Ok(ctx.snapshot())
}
