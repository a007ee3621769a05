// zahroshop/src/web/extractors.rs

//! Request extractors resolving the bearer token to a known user.
//!
//! `AuthenticatedUser` accepts any valid token; `AdminUser` additionally
//! requires the admin flag. Both fail with JSON errors through `AppError`.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::User;
use crate::services::auth_service::{parse_bearer, resolve_token};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub is_admin: bool,
}

impl From<User> for AuthenticatedUser {
  fn from(user: User) -> Self {
    Self {
      user_id: user.id,
      is_admin: user.is_admin,
    }
  }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
  let header = req
    .headers()
    .get(AUTHORIZATION)
    .ok_or_else(|| AppError::Auth("Missing Authorization header.".to_string()))?;
  let value = header
    .to_str()
    .map_err(|_| AppError::Auth("Malformed Authorization header.".to_string()))?;
  parse_bearer(value)
    .map(str::to_string)
    .ok_or_else(|| AppError::Auth("Expected a Bearer token.".to_string()))
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = bearer_token(req);
    let state = req.app_data::<web::Data<AppState>>().cloned();

    Box::pin(async move {
      let token = token.map_err(|e| {
        warn!(error = %e, "Rejected unauthenticated request.");
        e
      })?;
      let state = state.ok_or_else(|| AppError::Internal("AppState is not configured.".to_string()))?;
      let user = resolve_token(state.repos.identities.as_ref(), &token).await?;
      Ok(AuthenticatedUser::from(user))
    })
  }
}

/// An authenticated caller with the admin flag set.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let user = AuthenticatedUser::from_request(req, payload);
    Box::pin(async move {
      let user = user.await?;
      if !user.is_admin {
        warn!(user_id = %user.user_id, "Non-admin attempted an admin operation.");
        return Err(AppError::Forbidden("Administrator access required.".to_string()));
      }
      Ok(AdminUser(user))
    })
  }
}
