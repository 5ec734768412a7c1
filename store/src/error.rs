//! Error types for the example store.

use thiserror::Error;

use crate::example::ExampleId;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in the example store.
///
/// A missing example is not an error: lookups return `Option` and
/// deletes and usage increments treat it as a no-op.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input rejected before anything was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The usage counter of a record could not be updated.
    #[error("failed to increment usage of {id}: {reason}")]
    IncrementFailed { id: ExampleId, reason: String },

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IncrementFailed { .. } | Self::Storage(_) | Self::Io(_))
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create storage directory.
    #[error("failed to create directory: {0}")]
    CreateDirectory(String),

    /// Failed to read example file.
    #[error("failed to read file: {0}")]
    ReadFile(String),

    /// Failed to write example file.
    #[error("failed to write file: {0}")]
    WriteFile(String),

    /// Failed to delete example file.
    #[error("failed to delete file: {0}")]
    DeleteFile(String),
}
