//! Error types for Starchain Core.

use thiserror::Error;

/// Errors raised while encoding, decoding or checking core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed block: {0}")]
    MalformedBlock(String),

    #[error("malformed address: {0}")]
    MalformedAddress(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("invalid story: {0}")]
    InvalidStory(String),

    #[error("invalid star: {0}")]
    InvalidStar(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
