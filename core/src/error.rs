// zahroflow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Stage not found in flow '{flow}': {stage}")]
  StageNotFound { flow: String, stage: String },

  #[error("Stage '{stage}' is already defined in flow '{flow}'")]
  DuplicateStage { flow: String, stage: String },

  #[error("Handler missing for required stage: {stage}")]
  HandlerMissing { stage: String },

  #[error("No flow registered for context type {context_type}")]
  NotRegistered { context_type: String },

  #[error("Context type mismatch during dispatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Error in stage handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

// Handlers that bubble opaque failures up with `?` land here.
impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::HandlerError { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
