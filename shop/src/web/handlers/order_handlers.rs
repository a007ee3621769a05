// zahroshop/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::Order;
use crate::pipelines::checkout_pipeline::run_checkout;
use crate::pipelines::status_pipeline::run_status_change;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Debug)]
pub struct CreateOrderRequestPayload {
  pub address: Option<String>,
  pub total_price_cents: Option<i64>,
  pub phone: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CheckoutRequestPayload {
  pub address: Option<String>,
  pub phone: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusRequestPayload {
  pub order_id: Uuid,
  pub status: Option<String>,
}

/// Creates a `pending` order from an address and a client-supplied total.
#[instrument(name = "handler::create_order", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CreateOrderRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let address = payload
    .address
    .map(|a| a.trim().to_string())
    .filter(|a| !a.is_empty())
    .ok_or_else(|| AppError::Validation("address is required.".to_string()))?;
  let total_price_cents = match payload.total_price_cents {
    Some(total) if total > 0 => total,
    _ => {
      return Err(AppError::Validation(
        "total_price_cents must be a positive amount.".to_string(),
      ))
    }
  };

  let order = Order::new_pending(
    auth_user.user_id,
    address,
    payload.phone.unwrap_or_default(),
    total_price_cents,
  );
  app_state.repos.orders.create(&order).await?;
  info!(order_id = %order.id, total_price_cents, "Order created.");

  Ok(HttpResponse::Created().json(json!({ "order_id": order.id })))
}

/// Materializes the caller's cart into an order.
#[instrument(name = "handler::create_order_from_cart", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn create_order_from_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: Option<web::Json<CheckoutRequestPayload>>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.map(web::Json::into_inner).unwrap_or_default();
  let (order_id, total_price_cents) =
    run_checkout(&app_state, auth_user.user_id, payload.address, payload.phone).await?;
  info!(%order_id, total_price_cents, "Order created from cart.");

  Ok(HttpResponse::Created().json(json!({
    "order_id": order_id,
    "total_price_cents": total_price_cents,
  })))
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.repos.orders.list_for_user(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(
  name = "handler::get_order",
  skip(app_state, path, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path.as_ref())
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let orders = &app_state.repos.orders;
  let order = if auth_user.is_admin {
    orders.get(order_id).await?
  } else {
    orders.get_for_user(order_id, auth_user.user_id).await?
  };
  let order = order.ok_or_else(|| {
    warn!("Order {} not visible to caller.", order_id);
    AppError::NotFound(format!("Order with ID {} not found.", order_id))
  })?;
  let items = orders.items(order_id).await?;

  Ok(HttpResponse::Ok().json(json!({
    "order": order,
    "items": items,
  })))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, req_payload, admin),
  fields(admin_id = %admin.0.user_id, order_id = %req_payload.order_id)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<UpdateStatusRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let status = payload
    .status
    .filter(|s| !s.trim().is_empty())
    .ok_or_else(|| AppError::Validation("order_id and status are required.".to_string()))?;

  let outcome = run_status_change(&app_state, payload.order_id, status).await?;
  let new_status = outcome
    .new_status
    .or(outcome.previous_status)
    .ok_or_else(|| AppError::Internal("Status change finished without a status.".to_string()))?;
  info!(status = %new_status, changed = outcome.changed, "Status change handled.");

  Ok(HttpResponse::Ok().json(json!({
    "order_id": payload.order_id,
    "new_status": new_status,
    "changed": outcome.changed,
  })))
}
