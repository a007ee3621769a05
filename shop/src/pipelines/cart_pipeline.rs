// zahroshop/src/pipelines/cart_pipeline.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::CartItem;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use zahroflow::{Flow, FlowContext, FlowControl, FlowError, FlowRegistry, StageDef};

pub fn register_add_to_cart_pipeline(registry: &FlowRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Flow::<AddToCartCtxData, AppError>::new(
    "add_to_cart",
    [
      StageDef::required("validate_cart_input"),
      StageDef::required("fetch_product_for_cart"),
      StageDef::required("add_or_update_cart_item"),
    ],
  );

  p.on("validate_cart_input", |ctx: FlowContext<AddToCartCtxData>| async move {
    let quantity = ctx.update(|data| *data.quantity.get_or_insert(1));
    if quantity < 1 {
      warn!(quantity, "Add to Cart: quantity must be at least 1.");
      return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
    }
    Ok(FlowControl::Continue)
  })?;

  p.on("fetch_product_for_cart", |ctx: FlowContext<AddToCartCtxData>| async move {
    let (product_id, products) = {
      let guard = ctx.read();
      (guard.product_id, guard.app_state.repos.products.clone())
    };
    match products.get(product_id).await? {
      Some(product) => {
        info!(%product_id, title = %product.title, "Add to Cart: product found.");
        Ok::<_, AppError>(FlowControl::Continue)
      }
      None => {
        warn!(%product_id, "Add to Cart: product not found.");
        Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
      }
    }
  })?;

  // No stock check here: availability is only enforced by operators.
  p.on("add_or_update_cart_item", |ctx: FlowContext<AddToCartCtxData>| async move {
    let (user_id, product_id, quantity, carts) = {
      let guard = ctx.read();
      (
        guard.user_id,
        guard.product_id,
        guard.quantity.unwrap_or(1),
        guard.app_state.repos.carts.clone(),
      )
    };
    let item = carts.add(user_id, product_id, quantity).await?;
    info!(cart_item_id = %item.id, new_quantity = item.quantity, "Add to Cart: cart line updated.");
    ctx.write().updated_cart_item = Some(item);
    Ok::<_, AppError>(FlowControl::Continue)
  })?;

  registry.register(p);
  Ok(())
}

/// Adds `quantity` (default 1) of a product to the user's cart under the
/// user's cart lock.
#[instrument(name = "flow::add_to_cart", skip(state))]
pub async fn run_add_to_cart(
  state: &AppState,
  user_id: Uuid,
  product_id: Uuid,
  quantity: Option<i32>,
) -> AppResult<CartItem> {
  let _cart_guard = state.cart_locks.acquire(user_id).await;
  let ctx = FlowContext::new(AddToCartCtxData {
    app_state: state.clone(),
    user_id,
    product_id,
    quantity,
    updated_cart_item: None,
  });
  state.flows.run(ctx.clone()).await?;

  let item = ctx.write().updated_cart_item.take();
  item.ok_or_else(|| AppError::Internal("Cart update completed, but item details are unavailable.".to_string()))
}
