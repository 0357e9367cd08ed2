//! Typed errors for the component seams.
//!
//! Components return these; the application boundary (`main`, config) uses
//! `anyhow` on top of them.

use thiserror::Error;

/// The only failure text a user ever sees. Recommendation and capture
/// failures share it.
pub const USER_ERROR_MESSAGE: &str =
    "Sorry, we couldn't find songs for your mood right now. Please try again.";

/// Errors from the generative AI service.
#[derive(Debug, Error)]
pub enum RecommendationError {
    /// No API key was configured
    #[error("No API key configured (set GEMINI_API_KEY or pass --api-key)")]
    MissingApiKey,

    /// The HTTP call itself failed
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status
    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be turned into songs
    #[error("Invalid recommendation payload: {0}")]
    InvalidPayload(String),

    /// The image could not be classified into a mood
    #[error("No mood could be detected from the image")]
    NoMoodDetected,
}

impl From<reqwest::Error> for RecommendationError {
    fn from(e: reqwest::Error) -> Self {
        RecommendationError::Request(e.to_string())
    }
}

impl From<serde_json::Error> for RecommendationError {
    fn from(e: serde_json::Error) -> Self {
        RecommendationError::InvalidPayload(e.to_string())
    }
}

/// Errors from the key-value store. Always logged, never shown to the user.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// The photo could not be turned into an image payload.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Could not read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image {0} is empty")]
    Empty(String),

    #[error("Unsupported image type for {0} (use jpg, png, webp or gif)")]
    UnsupportedType(String),
}

/// A rating outside 0..=5.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Rating must be between 0 and 5, got {0}")]
pub struct RatingError(pub u8);
