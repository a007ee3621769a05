// zahroshop/src/pipelines/mod.rs

//! Defines and registers every flow used by the shop.

use crate::errors::AppError;
use zahroflow::{FlowError, FlowRegistry};

pub mod common_steps;
pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod payment_pipeline;
pub mod status_pipeline;

/// Registers all flows with `registry`. Called once at start-up.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) -> Result<(), FlowError> {
  tracing::info!("Registering flows...");

  cart_pipeline::register_add_to_cart_pipeline(registry)?;
  checkout_pipeline::register_checkout_pipeline(registry)?;
  status_pipeline::register_status_change_pipeline(registry)?;
  payment_pipeline::register_payment_pipeline(registry)?;

  tracing::info!(flows = ?registry.flow_names(), "All application flows registered.");
  Ok(())
}
