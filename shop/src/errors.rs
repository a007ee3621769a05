// zahroshop/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use zahroflow::FlowError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Cart is empty")]
  EmptyCart,

  #[error("Invalid order status: {0}")]
  InvalidStatus(String),

  #[error("Order {0} is already paid")]
  AlreadyPaid(uuid::Uuid),

  #[error("Insufficient bonus balance: requested {requested}, available {available}")]
  InsufficientBonus { requested: i64, available: i64 },

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Opaque failures from services and sinks surface as internal errors.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  /// Machine-readable error category returned alongside the message.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Validation(_) | AppError::EmptyCart | AppError::InvalidStatus(_) => "validation_error",
      AppError::NotFound(_) => "not_found",
      AppError::AlreadyPaid(_) | AppError::Conflict(_) => "conflict",
      AppError::InsufficientBonus { .. } => "insufficient_resource",
      AppError::Auth(_) => "unauthorized",
      AppError::Forbidden(_) => "forbidden",
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        "internal_error"
      }
    }
  }

  fn public_message(&self) -> String {
    match self {
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Workflow { .. } => "Workflow processing error".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
      other => other.to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::EmptyCart | AppError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::AlreadyPaid(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::InsufficientBonus { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, kind = self.kind(), "Responding with error");
    }
    HttpResponse::build(status).json(json!({
      "error": self.public_message(),
      "kind": self.kind(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
