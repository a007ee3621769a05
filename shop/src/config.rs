// zahroshop/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
  Postgres,
  Memory,
}

impl FromStr for StorageBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
      "memory" => Ok(StorageBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORAGE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub storage_backend: StorageBackend,
  /// Required when `storage_backend` is Postgres.
  pub database_url: Option<String>,
  pub db_max_connections: u32,

  pub payment_link_base: String,
  pub payment_merchant_phone: String,

  pub push_simulated_latency_ms: u64,

  pub seed_db: bool,
  pub seed_admin_token: String,

  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      storage_backend: StorageBackend::Postgres,
      database_url: None,
      db_max_connections: 5,
      payment_link_base: "https://bank.com/pay".to_string(),
      payment_merchant_phone: "+992927870019".to_string(),
      push_simulated_latency_ms: 20,
      seed_db: false,
      seed_admin_token: "dev-admin-token".to_string(),
      log_format: LogFormat::Pretty,
    }
  }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, value, e))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let defaults = Self::default();

    let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = parse_var("SERVER_PORT", lookup("SERVER_PORT"), defaults.server_port)?;

    let storage_backend = match lookup("STORAGE_BACKEND") {
      Some(raw) => raw.parse::<StorageBackend>()?,
      None => defaults.storage_backend,
    };
    let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
    if storage_backend == StorageBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required for the postgres backend)".to_string(),
      ));
    }
    let db_max_connections = parse_var(
      "DB_MAX_CONNECTIONS",
      lookup("DB_MAX_CONNECTIONS"),
      defaults.db_max_connections,
    )?;

    let payment_link_base = lookup("PAYMENT_LINK_BASE").unwrap_or(defaults.payment_link_base);
    let payment_merchant_phone = lookup("PAYMENT_MERCHANT_PHONE").unwrap_or(defaults.payment_merchant_phone);
    let push_simulated_latency_ms = parse_var(
      "PUSH_SIMULATED_LATENCY_MS",
      lookup("PUSH_SIMULATED_LATENCY_MS"),
      defaults.push_simulated_latency_ms,
    )?;

    let seed_db = parse_var("SEED_DB", lookup("SEED_DB"), defaults.seed_db)?;
    let seed_admin_token = lookup("SEED_ADMIN_TOKEN").unwrap_or(defaults.seed_admin_token);

    let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
      None | Some("pretty") => LogFormat::Pretty,
      Some("json") => LogFormat::Json,
      Some(other) => {
        return Err(AppError::Config(format!(
          "Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'",
          other
        )))
      }
    };

    Ok(Self {
      server_host,
      server_port,
      storage_backend,
      database_url,
      db_max_connections,
      payment_link_base,
      payment_merchant_phone,
      push_simulated_latency_ms,
      seed_db,
      seed_admin_token,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
