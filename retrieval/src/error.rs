//! Error types for retrieval and curation.

use thiserror::Error;

use exemplar_store::{ExampleId, StoreError};

use crate::cycle::CyclePhase;
use crate::generator::GeneratorError;

/// Result type alias for curation operations.
pub type Result<T> = std::result::Result<T, CurationError>;

/// Errors that can occur while retrieving examples or recording feedback.
#[derive(Error, Debug)]
pub enum CurationError {
    /// Example store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Input rejected before anything was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The answer generator failed or timed out.
    #[error("answer generation failed: {0}")]
    Upstream(#[from] GeneratorError),

    /// Some usage counters could not be incremented.
    #[error("usage increment failed for {} example(s)", .failed.len())]
    Concurrency { failed: Vec<ExampleId> },

    /// The submitted choice does not fit the generated answers.
    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    /// A feedback cycle step was called out of order.
    #[error("feedback cycle is {actual}, expected {expected}")]
    InvalidState {
        expected: CyclePhase,
        actual: CyclePhase,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CurationError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(_) | Self::Concurrency { .. } => true,
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
