//! Error types for Retrace

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for Retrace operations
pub type Result<T> = std::result::Result<T, RetraceError>;

/// Errors that can occur in Retrace
#[derive(Debug, Error)]
pub enum RetraceError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Archive location could not be resolved to bytes
    #[error("error retrieving {location}: {reason}")]
    Ingestion {
        /// Location identifier as given by the operator
        location: String,
        /// Underlying cause
        reason: String,
    },

    /// Location uses a scheme no blob source understands
    #[error("unsupported scheme: {0:?}")]
    UnsupportedScheme(String),

    /// Container is not a readable zip archive
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A non-empty archive entry could not be decoded into a record
    #[error("error unmarshaling archive file {entry}: {reason}")]
    InvalidEntry {
        /// Entry name inside the archive
        entry: String,
        /// Decoding failure
        reason: String,
    },

    /// Object store download failed
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Transport failure while talking to a remote endpoint
    #[error("error sending request: {0}")]
    Http(String),

    /// Per-request timeout elapsed
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Invocation-wide cancellation fired while a request was in flight
    #[error("request cancelled")]
    Cancelled,

    /// Records could not be rendered in the requested format
    #[error("render error: {0}")]
    Render(String),

    /// Payload is not valid snappy block data
    #[error("error decompressing with snappy: {0}")]
    Snappy(#[from] snap::Error),

    /// Payload is not a valid protobuf message
    #[error("error decoding protobuf: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// Remote storage answered with a non-200 status
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Input could not be interpreted as a record or remote-read message
    #[error("{0}")]
    Payload(String),
}

impl RetraceError {
    /// Whether the error aborts the whole invocation.
    ///
    /// Ingestion and configuration failures are fatal; transport failures
    /// only terminate the item they occurred on.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Http(_) | Self::Timeout(_) | Self::Cancelled)
    }

    pub(crate) fn ingestion(location: &str, reason: impl std::fmt::Display) -> Self {
        Self::Ingestion {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}
