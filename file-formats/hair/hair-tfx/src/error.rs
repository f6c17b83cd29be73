//! Error handling for hair asset loading, building and serialization

use std::io;
use thiserror::Error;

/// Errors that can occur when working with hair strand assets
#[derive(Debug, Error)]
pub enum HairError {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed text input
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number in the input
        line: usize,
        /// What went wrong
        message: String,
    },

    /// A configuration value is out of range
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Data validation failed
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Unexpected end of file
    #[error("Unexpected end of file")]
    UnexpectedEof,

    /// A count or index does not fit the fixed-width fields of the binary format
    #[error("Value too large for the asset format: {0}")]
    TooLarge(String),
}

impl HairError {
    /// Maps a short read to [`HairError::UnexpectedEof`], keeping other I/O errors intact
    pub(crate) fn from_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof
        } else {
            Self::Io(err)
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }
}

/// Type alias for Results from hair asset operations
pub type Result<T> = std::result::Result<T, HairError>;
