//! Error types for the retrieval system
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for retrieval operations
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding model errors
    #[error("Embedding model '{model}' could not be loaded: {reason}")]
    ModelUnavailable { model: String, reason: String },

    #[error("Failed to encode query: {reason}")]
    EncodingError { reason: String },

    /// Vector index errors
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index '{path}' is unavailable: {reason}")]
    IndexUnavailable { path: PathBuf, reason: String },

    /// Metadata store errors
    #[error("Metadata file '{path}' is unavailable: {reason}")]
    MetadataUnavailable { path: PathBuf, reason: String },

    #[error(
        "Index holds {index_len} vectors but metadata has {metadata_len} rows; they must come from the same corpus"
    )]
    ArtifactMismatch {
        index_len: usize,
        metadata_len: usize,
    },

    #[error("Corpus position {position} is out of range for {len} metadata rows")]
    PositionOutOfRange { position: i64, len: usize },

    /// Caller-imposed deadline elapsed
    #[error("Retrieval did not finish within {millis}ms")]
    Timeout { millis: u64 },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    /// Mutex poisoned error
    #[error("Internal mutex was poisoned, likely due to panic in another thread")]
    MutexPoisoned,

    /// Background retrieval task panicked or was cancelled
    #[error("Retrieval task failed: {reason}")]
    TaskFailed { reason: String },
}

impl RetrievalError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::ModelUnavailable { .. } => "MODEL_UNAVAILABLE",
            Self::EncodingError { .. } => "ENCODING_ERROR",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::IndexUnavailable { .. } => "INDEX_UNAVAILABLE",
            Self::MetadataUnavailable { .. } => "METADATA_UNAVAILABLE",
            Self::ArtifactMismatch { .. } => "ARTIFACT_MISMATCH",
            Self::PositionOutOfRange { .. } => "POSITION_OUT_OF_RANGE",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::MutexPoisoned => "MUTEX_POISONED",
            Self::TaskFailed { .. } => "TASK_FAILED",
        }
        .to_string()
    }

    /// Whether the error happens while loading artifacts.
    ///
    /// Load-time failures leave the process unable to serve any request.
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::ModelUnavailable { .. }
                | Self::IndexUnavailable { .. }
                | Self::MetadataUnavailable { .. }
                | Self::ArtifactMismatch { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::ModelUnavailable { .. } => vec![
                "Ensure you have internet connection for first-time model download",
                "Check that 'embedding.model' names a supported model",
                "Check permissions on the model cache directory",
            ],
            Self::EncodingError { .. } => vec!["Provide a non-empty query string"],
            Self::DimensionMismatch { .. } => vec![
                "The index was built with a different embedding model",
                "Set 'embedding.model' to the model used when building the index",
            ],
            Self::IndexUnavailable { .. } => vec![
                "Check that 'artifacts.index_path' points to a valid index file",
                "Rebuild the index and metadata together from the same corpus",
            ],
            Self::MetadataUnavailable { .. } => vec![
                "Check that 'artifacts.metadata_path' points to a CSV file",
                "The CSV header must contain 'Sentence' and 'StoryTitle' columns",
            ],
            Self::ArtifactMismatch { .. } => vec![
                "Rebuild the index and metadata together from the same corpus",
                "Check that the CSV has exactly one row per indexed sentence",
            ],
            Self::Timeout { .. } => vec![
                "Increase 'retrieval.timeout_ms'",
                "Lower 'retrieval.nprobe' to search fewer partitions",
            ],
            Self::Config { .. } => vec!["Run 'storyctx init --force' to regenerate settings"],
            Self::MutexPoisoned => vec!["Restart the application to clear the poisoned state"],
            Self::PositionOutOfRange { .. } | Self::TaskFailed { .. } => vec![],
        }
    }
}

/// Result type alias for retrieval operations
pub type RetrieveResult<T> = Result<T, RetrievalError>;
