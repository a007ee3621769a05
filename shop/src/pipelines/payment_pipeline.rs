// zahroshop/src/pipelines/payment_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::PaymentStatus;
use crate::pipelines::contexts::PaymentCtxData;
use crate::services::payment_mock;
use crate::state::AppState;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use zahroflow::{Flow, FlowContext, FlowControl, FlowError, FlowRegistry, StageDef};

pub fn register_payment_pipeline(registry: &FlowRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Flow::<PaymentCtxData, AppError>::new(
    "process_payment",
    [
      StageDef::required("load_order_for_user"),
      StageDef::required("guard_duplicate_payment"),
      StageDef::required("record_payment"),
      StageDef::optional("build_payment_link"),
    ],
  );

  p.on("load_order_for_user", |ctx: FlowContext<PaymentCtxData>| async move {
    let (order_id, user_id, orders) = {
      let guard = ctx.read();
      (guard.order_id, guard.user_id, guard.app_state.repos.orders.clone())
    };
    let order = orders
      .get_for_user(order_id, user_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;
    ctx.write().order = Some(order);
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  p.on("guard_duplicate_payment", |ctx: FlowContext<PaymentCtxData>| async move {
    let (order_id, payments) = {
      let guard = ctx.read();
      (guard.order_id, guard.app_state.repos.payments.clone())
    };
    if let Some(existing) = payments.get_for_order(order_id).await? {
      warn!(%order_id, method = %existing.method, "Payment rejected: order already paid.");
      return Err(AppError::AlreadyPaid(order_id));
    }
    Ok(FlowControl::Continue)
  })?;

  p.on("record_payment", |ctx: FlowContext<PaymentCtxData>| async move {
    let (order_id, method, repos) = {
      let guard = ctx.read();
      (guard.order_id, guard.payment_method.clone(), guard.app_state.repos.clone())
    };
    // A concurrent writer in another process may have inserted first.
    let payment = repos
      .payments
      .create_if_absent(order_id, &method, PaymentStatus::Paid)
      .await?
      .ok_or(AppError::AlreadyPaid(order_id))?;
    repos.orders.mark_paid(order_id).await?;
    info!(%order_id, payment_id = %payment.id, %method, "Payment recorded.");
    ctx.write().payment = Some(payment);
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  p.on("build_payment_link", |ctx: FlowContext<PaymentCtxData>| async move {
    ctx.update(|data| {
      let total = data.order.as_ref().map_or(0, |order| order.total_price_cents);
      let config = &data.app_state.config;
      data.payment_link = Some(payment_mock::build_payment_link(
        &config.payment_link_base,
        total,
        &config.payment_merchant_phone,
      ));
    });
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  registry.register(p);
  Ok(())
}

/// Records a `paid` payment for one of the user's orders, unless the order
/// already has a payment.
#[instrument(name = "flow::process_payment", skip(state))]
pub async fn run_payment(
  state: &AppState,
  user_id: Uuid,
  order_id: Uuid,
  payment_method: String,
) -> AppResult<PaymentCtxData> {
  if payment_method.trim().is_empty() {
    return Err(AppError::Validation("payment_method is required.".to_string()));
  }
  let _order_guard = state.order_locks.acquire(order_id).await;
  let ctx = FlowContext::new(PaymentCtxData {
    app_state: state.clone(),
    user_id,
    order_id,
    payment_method,
    order: None,
    payment: None,
    payment_link: None,
  });
  state.flows.run(ctx.clone()).await?;
  Ok(ctx.snapshot())
}
