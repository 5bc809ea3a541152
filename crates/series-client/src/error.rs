//! Error types for publishing series.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Result type for client operations.
pub type CommResult<T> = Result<T, Report<CommError>>;

/// Errors that can occur while shipping a series to the collector.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum CommError {
    /// Network connectivity issues
    #[display("Network error: {message}")]
    Network { message: String },

    /// Collector answered with a non-success status
    #[display("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Serialization errors
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// Configuration errors
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// Timeout errors
    #[display("Operation timed out after {millis}ms")]
    Timeout { millis: u64 },
}

impl Error for CommError {}
