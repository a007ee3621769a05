// zahroshop/src/web/handlers/account_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct SaveDeviceTokenPayload {
  pub fcm_token: Option<String>,
}

/// Registers (or replaces) the caller's push-notification target.
#[instrument(name = "handler::save_fcm_token", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn save_fcm_token_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<SaveDeviceTokenPayload>,
) -> Result<HttpResponse, AppError> {
  let token = req_payload
    .into_inner()
    .fcm_token
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::Validation("fcm_token is required.".to_string()))?;

  app_state.repos.devices.upsert(auth_user.user_id, &token).await?;
  info!("Device token saved.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Device token saved." })))
}

#[instrument(name = "handler::admin_check", skip(auth_user), fields(user_id = %auth_user.user_id))]
pub async fn admin_check_handler(auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(json!({ "is_admin": auth_user.is_admin })))
}
