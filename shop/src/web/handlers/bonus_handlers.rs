// zahroshop/src/web/handlers/bonus_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::bonus_ledger;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, Debug)]
pub struct AccrueBonusRequestPayload {
  pub user_id: Uuid,
  pub amount: i64,
}

#[derive(Deserialize, Debug)]
pub struct RedeemBonusRequestPayload {
  pub amount: i64,
}

#[instrument(name = "handler::get_bonus", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_bonus_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let balance = bonus_ledger::balance(app_state.repos.bonuses.as_ref(), auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "balance": balance })))
}

#[instrument(
  name = "handler::accrue_bonus",
  skip(app_state, req_payload, admin),
  fields(admin_id = %admin.0.user_id, user_id = %req_payload.user_id, amount = req_payload.amount)
)]
pub async fn accrue_bonus_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  req_payload: web::Json<AccrueBonusRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let balance = bonus_ledger::accrue(app_state.repos.bonuses.as_ref(), payload.user_id, payload.amount).await?;
  Ok(HttpResponse::Ok().json(json!({
    "user_id": payload.user_id,
    "balance": balance,
  })))
}

#[instrument(
  name = "handler::redeem_bonus",
  skip(app_state, req_payload, auth_user),
  fields(user_id = %auth_user.user_id, amount = req_payload.amount)
)]
pub async fn redeem_bonus_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<RedeemBonusRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let balance = bonus_ledger::debit(
    app_state.repos.bonuses.as_ref(),
    auth_user.user_id,
    req_payload.amount,
  )
  .await?;
  Ok(HttpResponse::Ok().json(json!({ "balance": balance })))
}
