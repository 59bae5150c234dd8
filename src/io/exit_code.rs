//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - results found
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - artifacts could not be loaded, nothing can be served
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::RetrievalError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Startup failure that should halt automation (code 2)
    BlockingError = 2,

    /// Query ran but returned no sentences (code 3)
    NotFound = 3,

    /// Query could not be encoded (code 4)
    EncodingError = 4,

    /// Query and index disagree on vector dimension (code 5)
    DimensionMismatch = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Retrieval exceeded its deadline (code 9)
    Timeout = 9,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Convert a `RetrievalError` to the appropriate exit code.
    pub fn from_error(error: &RetrievalError) -> Self {
        match error {
            // Nothing can be served without the artifacts
            e if e.is_startup_failure() => ExitCode::BlockingError,

            RetrievalError::EncodingError { .. } => ExitCode::EncodingError,
            RetrievalError::DimensionMismatch { .. } => ExitCode::DimensionMismatch,
            RetrievalError::Config { .. } => ExitCode::ConfigError,
            RetrievalError::Timeout { .. } => ExitCode::Timeout,

            _ => ExitCode::GeneralError,
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }
}
