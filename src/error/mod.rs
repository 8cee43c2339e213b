//! Error handling for the derivation pipeline.

use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Errors that can abort a pipeline run.
///
/// Only a subset of the data-quality taxonomy is fatal: a missing or
/// mistyped upstream column (`Schema`) always is, because no partial output
/// may ever be published. Countable conditions (missing references, range
/// violations, guarded divisions) are tracked in
/// [`crate::pipeline::QualityCounters`] instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// A required upstream column is missing or has the wrong type
    #[error("Schema error in source '{source_name}': {message}")]
    Schema {
        /// Name of the source table being validated
        source_name: String,
        /// Description of the violated precondition
        message: String,
    },

    /// Error converting derived rows to an Arrow record batch
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_arrow::Error),

    /// Error serializing the run summary
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A snapshot directory or file is absent
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Build a schema error for a named source table.
    pub fn schema(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
