// zahroshop/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipelines::payment_pipeline::run_payment;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct ProcessPaymentRequestPayload {
  pub order_id: Uuid,
  pub payment_method: Option<String>,
}

#[instrument(
  name = "handler::process_payment",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %req_payload.order_id)
)]
pub async fn process_payment_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<ProcessPaymentRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let outcome = run_payment(
    &app_state,
    auth_user.user_id,
    payload.order_id,
    payload.payment_method.unwrap_or_default(),
  )
  .await?;
  info!(method = %outcome.payment_method, "Payment processed.");

  Ok(HttpResponse::Ok().json(json!({
    "order_id": outcome.order_id,
    "payment_method": outcome.payment_method,
    "payment_link": outcome.payment_link,
  })))
}
