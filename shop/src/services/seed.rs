// zahroshop/src/services/seed.rs

//! Development data: a small catalog and, for the in-memory backend, an
//! admin user reachable through a fixed token.

use crate::errors::Result as AppResult;
use crate::models::NewProduct;
use crate::repo::{MemoryStore, ProductRepository};
use tracing::{info, instrument};

fn sample_catalog() -> Vec<NewProduct> {
  vec![
    NewProduct {
      title: "Green Tea".to_string(),
      description: Some("Loose leaf, 100 g".to_string()),
      price_cents: 10_000,
      discount_price_cents: None,
      category: "tea".to_string(),
      stock: 50,
    },
    NewProduct {
      title: "Honey Jar".to_string(),
      description: Some("Mountain honey, 500 g".to_string()),
      price_cents: 5_000,
      discount_price_cents: Some(4_000),
      category: "sweets".to_string(),
      stock: 20,
    },
    NewProduct {
      title: "Dried Apricots".to_string(),
      description: None,
      price_cents: 3_500,
      discount_price_cents: None,
      category: "dried fruit".to_string(),
      stock: 35,
    },
  ]
}

#[instrument(name = "seed::catalog", skip(products))]
pub async fn seed_catalog(products: &dyn ProductRepository) -> AppResult<usize> {
  if !products.list().await?.is_empty() {
    info!("Catalog already populated; skipping seed.");
    return Ok(0);
  }
  let catalog = sample_catalog();
  let count = catalog.len();
  for product in catalog {
    products.create(product).await?;
  }
  info!(count, "Catalog seeded.");
  Ok(count)
}

pub fn seed_admin(store: &MemoryStore, raw_token: &str) {
  let admin = store.seed_user("admin", true, raw_token);
  info!(user_id = %admin.id, "Seeded in-memory admin user.");
}
