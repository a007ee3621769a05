// zahroshop/src/web/routes.rs

use actix_web::{error, web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{
  account_handlers, bonus_handlers, cart_handlers, order_handlers, payment_handlers, product_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Malformed bodies and path segments answer with the same JSON error shape as
// handler failures.
fn json_error_handler(err: error::JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
  AppError::Validation(err.to_string()).into()
}

fn path_error_handler(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
  AppError::Validation(err.to_string()).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
            .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
            .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::get_cart_handler))
            .route("/add", web::post().to(cart_handlers::add_to_cart_handler))
            .route(
              "/remove/{product_id}",
              web::delete().to(cart_handlers::remove_from_cart_handler),
            ),
        )
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("", web::post().to(order_handlers::create_order_handler))
            .route(
              "/update-status",
              web::post().to(order_handlers::update_order_status_handler),
            )
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
        )
        .route(
          "/order/create",
          web::post().to(order_handlers::create_order_from_cart_handler),
        )
        .route(
          "/payment/process",
          web::post().to(payment_handlers::process_payment_handler),
        )
        .service(
          web::scope("/bonus")
            .route("", web::get().to(bonus_handlers::get_bonus_handler))
            .route("/accrue", web::post().to(bonus_handlers::accrue_bonus_handler))
            .route("/redeem", web::post().to(bonus_handlers::redeem_bonus_handler)),
        )
        .route(
          "/save_fcm_token",
          web::post().to(account_handlers::save_fcm_token_handler),
        )
        .route("/admin-check", web::get().to(account_handlers::admin_check_handler)),
    );
}
