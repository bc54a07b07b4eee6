//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No image #{} (choose 1-{len})", .index + 1)]
    InvalidSelection { index: usize, len: usize },

    #[error("No images yet; use 'new' first")]
    NoImages,

    #[error("No image has been selected")]
    NoSelection,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    /// The error for picking image `index` out of `len`.
    pub fn bad_selection(index: usize, len: usize) -> Self {
        if len == 0 {
            Error::NoImages
        } else {
            Error::InvalidSelection { index, len }
        }
    }

    /// Whether a request that failed with this error is worth sending again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(_) | Error::AiProvider(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
