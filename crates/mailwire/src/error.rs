//! Error types for header operations.

use std::io;
use std::string::FromUtf8Error;

/// Result type alias for header operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Header error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Requested header field is not present.
    #[error("Message missing header field: {0}")]
    MissingField(String),

    /// Invalid address list.
    #[error("Invalid address list: {0}")]
    InvalidAddress(String),

    /// Invalid date.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// Entropy source failed while generating an identifier.
    #[error("Identifier generation failed: {0}")]
    IdGeneration(#[from] rand::Error),

    /// Writing to the output sink failed.
    #[error("Write failed after {written} bytes: {source}")]
    Write {
        /// Bytes flushed to the sink before the failure.
        written: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Creates a write error carrying the partial byte count.
    #[must_use]
    pub const fn write(written: u64, source: io::Error) -> Self {
        Self::Write { written, source }
    }

    /// Returns true if this error came from parsing header text.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_)
                | Self::InvalidDate(_)
                | Self::InvalidContentType(_)
                | Self::InvalidEncoding(_)
                | Self::Base64Decode(_)
                | Self::Utf8Decode(_)
        )
    }

    /// Returns the number of bytes written before a write failure.
    #[must_use]
    pub const fn bytes_written(&self) -> Option<u64> {
        match self {
            Self::Write { written, .. } => Some(*written),
            _ => None,
        }
    }
}
