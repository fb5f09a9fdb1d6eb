//! Error types for the listing-inference crate.
//!
//! This module defines [`InferenceError`], the main error type used throughout
//! the crate. All public API functions return `Result<T, InferenceError>`.
//!
//! A record that does not fit the training schema is never an error: missing
//! fields, unknown fields and unseen categories are reconciled away. Errors
//! here mean the artifacts, the input shape or the model itself are unusable.

use listing_features::FeatureError;
use thiserror::Error;

/// The main error type for listing-inference operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum InferenceError {
    /// The feature pipeline failed (unreadable artifacts, malformed record,
    /// invalid rules).
    #[error(transparent)]
    Features(#[from] FeatureError),

    /// The training run the artifacts come from cannot be replayed.
    ///
    /// Common causes:
    /// - The report was produced with encoding disabled
    /// - The schema file belongs to a different training run
    #[error("Incompatible artifacts: {0}")]
    IncompatibleArtifacts(String),

    /// The regressor failed or returned an unexpected number of outputs.
    #[error("Model error: {0}")]
    Model(String),

    /// I/O error during artifact loading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    /// Check if the error is caused by the submitted record.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::Features(e) => e.is_input_error(),
            _ => false,
        }
    }
}

/// Result type alias for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
