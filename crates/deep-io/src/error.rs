//! Error types for I/O operations.
//!
//! Provides unified error handling for the deep file codec, flat sinks and
//! deep shadow ingestion.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error from the deep image model.
    #[error(transparent)]
    Core(#[from] deep_core::Error),

    /// File was written by a newer version of the format.
    #[error("unsupported format version {found} (newest supported is {supported})")]
    UnsupportedVersion {
        /// Version stored in the file
        found: i32,
        /// Newest version this library reads
        supported: i32,
    },

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;

impl IoError {
    /// Creates an [`IoError::DecodeError`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Creates an [`IoError::EncodeError`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::EncodeError(msg.into())
    }
}
