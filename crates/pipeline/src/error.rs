//! Error types for the pipeline crate.

use thiserror::Error;

/// Errors the core pipeline can raise.
///
/// The pipeline never retries: the first failure aborts the run and is
/// propagated unchanged to the driver. Degenerate inputs (empty user or
/// course tables) are not errors and yield empty results.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// `top_k` must be at least 1
    #[error("top_k must be at least 1, got {0}")]
    InvalidTopK(usize),

    /// A level outside {0, 1, 2, 3} survived loading
    #[error("{entity} '{id}' has level {level}, expected 0..=3")]
    InvalidLevel {
        entity: &'static str,
        id: String,
        level: u8,
    },

    /// Penalty vector present but empty or with values outside [0, 1]
    #[error("Invalid penalty weights: {0}")]
    InvalidPenaltyWeights(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, PipelineError>;
