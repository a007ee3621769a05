// zahroshop/src/services/mod.rs

pub mod auth_service;
pub mod bonus_ledger;
pub mod payment_mock;
pub mod push_mock;
pub mod seed;
