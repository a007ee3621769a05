// zahroshop/src/web/handlers/mod.rs

pub mod account_handlers;
pub mod bonus_handlers;
pub mod cart_handlers;
pub mod order_handlers;
pub mod payment_handlers;
pub mod product_handlers;
