// zahroshop/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cart_total_cents;
use crate::pipelines::cart_pipeline::run_add_to_cart;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  /// Defaults to 1 when omitted.
  pub quantity: Option<i32>,
}

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let lines = app_state.repos.carts.lines(auth_user.user_id).await?;
  let items = lines
    .iter()
    .map(|line| {
      Ok(json!({
        "id": line.id,
        "product_id": line.product_id,
        "title": line.title,
        "quantity": line.quantity,
        "unit_price_cents": line.unit_price_cents(),
        "line_total_cents": line.line_total_cents()?,
      }))
    })
    .collect::<Result<Vec<_>, AppError>>()?;
  let total_price_cents = cart_total_cents(&lines)?;

  Ok(HttpResponse::Ok().json(json!({
    "items": items,
    "total_price_cents": total_price_cents,
  })))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, product_id = %req_payload.product_id, quantity = ?req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<AddToCartRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let item = run_add_to_cart(&app_state, auth_user.user_id, payload.product_id, payload.quantity).await?;
  info!(cart_item_id = %item.id, quantity = item.quantity, "Cart updated.");
  Ok(HttpResponse::Created().json(item))
}

#[instrument(
  name = "handler::remove_from_cart",
  skip(app_state, path, auth_user),
  fields(user_id = %auth_user.user_id, product_id = %path.as_ref())
)]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let removed = {
    let _cart_guard = app_state.cart_locks.acquire(auth_user.user_id).await;
    app_state.repos.carts.remove(auth_user.user_id, product_id).await?
  };
  if !removed {
    warn!("No cart line for product {}.", product_id);
    return Err(AppError::NotFound(format!("Product {} is not in the cart.", product_id)));
  }
  Ok(HttpResponse::NoContent().finish())
}
