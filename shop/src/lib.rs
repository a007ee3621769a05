// zahroshop/src/lib.rs

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod repo;
pub mod services;
pub mod state;
pub mod web;
