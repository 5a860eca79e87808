//! Driver-side error types and failure-callback error codes.

use thiserror::Error;

/// A configuration value failed to parse or validate at startup.
#[derive(Error, Debug)]
#[error("Invalid configuration for {var}: {reason}")]
pub struct ConfigError {
    pub var: String,
    pub reason: String,
}

impl ConfigError {
    pub fn new(var: &str, reason: impl Into<String>) -> Self {
        Self {
            var: var.to_string(),
            reason: reason.into(),
        }
    }
}

/// Object-storage transfer failed after all retries.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct StorageError(pub String);

/// Completion callback could not be delivered.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct CallbackError(pub String);

/// Callback `error_code` for a failed run, derived from the concrete error
/// type behind the `anyhow` chain.
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if err.downcast_ref::<StorageError>().is_some() {
        return "STORAGE_ERROR";
    }
    if err.downcast_ref::<data_loader::DataLoadError>().is_some() {
        return "PARSING_ERROR";
    }
    if let Some(err) = err.downcast_ref::<pipeline::PipelineError>() {
        return match err {
            pipeline::PipelineError::InvalidTopK(_)
            | pipeline::PipelineError::InvalidLevel { .. } => "INVALID_INPUT",
            pipeline::PipelineError::InvalidPenaltyWeights(_) => "CONFIG_ERROR",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "CONFIG_ERROR";
    }
    "INTERNAL_ERROR"
}
