// zahroshop/src/models/mod.rs

//! Data structures representing database entities.

pub mod bonus;
pub mod cart_item;
pub mod identity;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;

pub use bonus::BonusAccount;
pub use cart_item::{cart_total_cents, CartItem, CartLine};
pub use identity::{DeviceToken, User};
pub use order::{Order, OrderStatus, PaymentState};
pub use order_item::OrderItem;
pub use payment::{Payment, PaymentStatus};
pub use product::{effective_price_cents, NewProduct, Product, ProductPatch};
