// zahroshop/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewProduct, ProductPatch};
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = app_state.repos.products.list().await?;
  info!("Fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  match app_state.repos.products.get(product_id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(product)),
    None => {
      warn!("Product {} not found.", product_id);
      Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
    }
  }
}

#[instrument(
  name = "handler::create_product",
  skip(app_state, admin, payload),
  fields(admin_id = %admin.0.user_id, title = %payload.title)
)]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let input = payload.into_inner();
  input.validate()?;
  let product = app_state.repos.products.create(input).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(
  name = "handler::update_product",
  skip(app_state, admin, path, payload),
  fields(admin_id = %admin.0.user_id, product_id = %path.as_ref())
)]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let patch = payload.into_inner();
  patch.validate()?;
  let product = app_state
    .repos
    .products
    .update(product_id, patch)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product_id)))?;
  info!("Product updated.");
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(
  name = "handler::delete_product",
  skip(app_state, admin, path),
  fields(admin_id = %admin.0.user_id, product_id = %path.as_ref())
)]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  if !app_state.repos.products.delete(product_id).await? {
    return Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)));
  }
  info!("Product deleted.");
  Ok(HttpResponse::NoContent().finish())
}
