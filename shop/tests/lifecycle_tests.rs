// tests/lifecycle_tests.rs
mod common;

use common::{add_product, shop, shop_with_sink, FailingSink, TestShop};
use std::sync::Arc;
use uuid::Uuid;
use zahroshop::errors::AppError;
use zahroshop::models::OrderStatus;
use zahroshop::pipelines::cart_pipeline::run_add_to_cart;
use zahroshop::pipelines::checkout_pipeline::run_checkout;
use zahroshop::pipelines::status_pipeline::run_status_change;

/// Places a 240.00 order (2 x Plain@100.00, 1 x Discounted@40.00) for the customer.
async fn place_order(shop: &TestShop) -> (Uuid, Uuid, Uuid) {
  let state = &shop.state;
  let plain = add_product(state, "Plain", 10_000, None, 10).await;
  let discounted = add_product(state, "Discounted", 5_000, Some(4_000), 10).await;
  run_add_to_cart(state, shop.customer.id, plain.id, Some(2)).await.unwrap();
  run_add_to_cart(state, shop.customer.id, discounted.id, Some(1)).await.unwrap();
  let (order_id, total) = run_checkout(state, shop.customer.id, Some("Main st 1".into()), None)
    .await
    .unwrap();
  assert_eq!(total, 24_000);
  (order_id, plain.id, discounted.id)
}

async fn stock_of(shop: &TestShop, product_id: Uuid) -> i32 {
  shop.state.repos.products.get(product_id).await.unwrap().unwrap().stock
}

#[tokio::test]
async fn shipping_runs_fulfillment_once() {
  let (shop, sink) = shop();
  let (order_id, plain, discounted) = place_order(&shop).await;

  // A fresh cart line that shipping should clear.
  run_add_to_cart(&shop.state, shop.customer.id, plain, Some(1)).await.unwrap();

  let outcome = run_status_change(&shop.state, order_id, "shipped".into()).await.unwrap();
  assert!(outcome.changed);
  assert_eq!(outcome.previous_status, Some(OrderStatus::Pending));
  assert_eq!(outcome.new_status, Some(OrderStatus::Shipped));
  assert_eq!(outcome.stock_lines_adjusted, 2);
  assert_eq!(outcome.bonus_accrued, 24);
  assert_eq!(outcome.cart_lines_cleared, 1);
  assert!(outcome.notification_sent);

  assert_eq!(stock_of(&shop, plain).await, 8);
  assert_eq!(stock_of(&shop, discounted).await, 9);
  assert_eq!(shop.state.repos.bonuses.balance(shop.customer.id).await.unwrap(), 24);
  assert!(shop.state.repos.carts.lines(shop.customer.id).await.unwrap().is_empty());
  assert_eq!(sink.count(), 1);
  assert_eq!(sink.bodies()[0], format!("Your order #{} is now: Shipped!", order_id));

  let stored = shop.state.repos.orders.get(order_id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn repeating_the_same_status_has_no_side_effects() {
  let (shop, sink) = shop();
  let (order_id, plain, _) = place_order(&shop).await;

  run_status_change(&shop.state, order_id, "shipped".into()).await.unwrap();
  let again = run_status_change(&shop.state, order_id, "shipped".into()).await.unwrap();

  assert!(!again.changed);
  assert_eq!(again.new_status, Some(OrderStatus::Shipped));
  assert_eq!(stock_of(&shop, plain).await, 8);
  assert_eq!(shop.state.repos.bonuses.balance(shop.customer.id).await.unwrap(), 24);
  assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn non_shipping_change_only_notifies() {
  let (shop, sink) = shop();
  let (order_id, plain, _) = place_order(&shop).await;

  let outcome = run_status_change(&shop.state, order_id, "processing".into()).await.unwrap();
  assert!(outcome.changed);
  assert_eq!(outcome.bonus_accrued, 0);
  assert_eq!(stock_of(&shop, plain).await, 10);
  assert_eq!(shop.state.repos.bonuses.balance(shop.customer.id).await.unwrap(), 0);
  assert_eq!(sink.bodies(), vec![format!("Your order #{} is now: Processing!", order_id)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ship_requests_fulfill_once() {
  let (shop, sink) = shop();
  let (order_id, plain, discounted) = place_order(&shop).await;

  let mut handles = Vec::new();
  for _ in 0..8 {
    let state = shop.state.clone();
    handles.push(tokio::spawn(async move {
      run_status_change(&state, order_id, "shipped".into()).await
    }));
  }
  let mut changed = 0;
  for handle in handles {
    if handle.await.unwrap().unwrap().changed {
      changed += 1;
    }
  }

  assert_eq!(changed, 1);
  assert_eq!(stock_of(&shop, plain).await, 8);
  assert_eq!(stock_of(&shop, discounted).await, 9);
  assert_eq!(shop.state.repos.bonuses.balance(shop.customer.id).await.unwrap(), 24);
  assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_change() {
  let shop = shop_with_sink(Arc::new(FailingSink));
  let (order_id, _, _) = place_order(&shop).await;

  let outcome = run_status_change(&shop.state, order_id, "shipped".into()).await.unwrap();
  assert!(outcome.changed);
  assert!(!outcome.notification_sent);
  assert_eq!(shop.state.repos.bonuses.balance(shop.customer.id).await.unwrap(), 24);
}

#[tokio::test]
async fn unknown_status_is_rejected_without_changes() {
  let (shop, sink) = shop();
  let (order_id, _, _) = place_order(&shop).await;

  for bad in ["teleported", "Shipped", ""] {
    let err = run_status_change(&shop.state, order_id, bad.into()).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStatus(_)), "{bad:?} gave {err:?}");
  }
  let stored = shop.state.repos.orders.get(order_id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Pending);
  assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn missing_order_is_reported_before_status_validation() {
  let (shop, _sink) = shop();
  let err = run_status_change(&shop.state, Uuid::new_v4(), "teleported".into())
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn any_transition_is_allowed() {
  let (shop, sink) = shop();
  let (order_id, _, _) = place_order(&shop).await;

  for status in ["delivered", "pending", "cancelled", "processing"] {
    let outcome = run_status_change(&shop.state, order_id, status.into()).await.unwrap();
    assert!(outcome.changed, "{status}");
    let stored = shop.state.repos.orders.get(order_id).await.unwrap().unwrap();
    assert_eq!(stored.status.as_str(), status);
  }
  // Delivered closed the order, so only the first change notified.
  assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn reentering_shipped_does_not_fulfill_again() {
  let (shop, sink) = shop();
  let (order_id, plain, discounted) = place_order(&shop).await;

  let first = run_status_change(&shop.state, order_id, "shipped".into()).await.unwrap();
  assert_eq!(first.bonus_accrued, 24);
  assert!(!first.was_closed);

  // Refill the cart so a second fulfillment would be visible.
  run_add_to_cart(&shop.state, shop.customer.id, plain, Some(1)).await.unwrap();

  for status in ["delivered", "shipped", "cancelled", "shipped"] {
    let outcome = run_status_change(&shop.state, order_id, status.into()).await.unwrap();
    assert!(outcome.changed, "{status}");
    assert!(outcome.was_closed, "{status}");
    assert_eq!(outcome.stock_lines_adjusted, 0, "{status}");
    assert_eq!(outcome.bonus_accrued, 0, "{status}");
    assert_eq!(outcome.cart_lines_cleared, 0, "{status}");
    assert!(!outcome.notification_sent, "{status}");
  }

  assert_eq!(stock_of(&shop, plain).await, 8);
  assert_eq!(stock_of(&shop, discounted).await, 9);
  assert_eq!(shop.state.repos.bonuses.balance(shop.customer.id).await.unwrap(), 24);
  assert_eq!(shop.state.repos.carts.lines(shop.customer.id).await.unwrap().len(), 1);
  assert_eq!(sink.count(), 1);

  let stored = shop.state.repos.orders.get(order_id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Shipped);
  assert!(stored.is_closed());
}

#[tokio::test]
async fn shipping_after_cancellation_does_not_fulfill() {
  let (shop, sink) = shop();
  let (order_id, plain, _) = place_order(&shop).await;

  for status in ["cancelled", "processing", "shipped"] {
    run_status_change(&shop.state, order_id, status.into()).await.unwrap();
  }

  assert_eq!(stock_of(&shop, plain).await, 10);
  assert_eq!(shop.state.repos.bonuses.balance(shop.customer.id).await.unwrap(), 0);
  assert_eq!(sink.bodies(), vec![format!("Your order #{} is now: Cancelled!", order_id)]);
}

#[tokio::test]
async fn processing_detour_before_shipping_still_fulfills() {
  let (shop, _sink) = shop();
  let (order_id, plain, _) = place_order(&shop).await;

  for status in ["processing", "pending", "shipped"] {
    run_status_change(&shop.state, order_id, status.into()).await.unwrap();
  }

  assert_eq!(stock_of(&shop, plain).await, 8);
  assert_eq!(shop.state.repos.bonuses.balance(shop.customer.id).await.unwrap(), 24);
}
