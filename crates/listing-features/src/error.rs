//! Custom error types for the feature pipeline.
//!
//! Only conditions the caller must act on are errors here. Unparseable cells,
//! unknown categories and schema mismatches at inference are handled locally
//! and never surface through this type.
//!
//! Errors are serializable so they can be returned verbatim from a JSON API.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for the feature pipeline.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// The configured target column is not present after column normalization.
    #[error("Target column '{0}' not found in dataset")]
    MissingTargetColumn(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// A rule table could not be compiled.
    #[error("Invalid rule for '{table}': {reason}")]
    InvalidRule { table: String, reason: String },

    /// Input could not be interpreted as a record or table.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A persisted artifact (schema, report, rules) is unusable.
    #[error("Invalid artifact '{path}': {reason}")]
    InvalidArtifact { path: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FeatureError>,
    },
}

impl FeatureError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FeatureError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for API consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingTargetColumn(_) => "MISSING_TARGET_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidRule { .. } => "INVALID_RULE",
            Self::MalformedInput(_) => "MALFORMED_INPUT",
            Self::InvalidArtifact { .. } => "INVALID_ARTIFACT",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the error is caused by the input data rather than by the
    /// environment or configuration.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::MissingTargetColumn(_) | Self::MalformedInput(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for FeatureError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("FeatureError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for feature pipeline operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| FeatureError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| FeatureError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            FeatureError::MissingTargetColumn("urun_fiyat".to_string()).error_code(),
            "MISSING_TARGET_COLUMN"
        );
        assert_eq!(
            FeatureError::MalformedInput("x".to_string()).error_code(),
            "MALFORMED_INPUT"
        );
    }

    #[test]
    fn test_missing_target_names_the_column() {
        let error = FeatureError::MissingTargetColumn("urun_fiyat".to_string());
        assert!(error.to_string().contains("urun_fiyat"));
        assert!(error.is_input_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = FeatureError::InvalidArtifact {
            path: "schema.json".to_string(),
            reason: "expected a list".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("INVALID_ARTIFACT"));
        assert!(json.contains("schema.json"));
    }

    #[test]
    fn test_with_context() {
        let error = FeatureError::MissingTargetColumn("price".to_string())
            .with_context("During training");
        assert!(error.to_string().contains("During training"));
        assert_eq!(error.error_code(), "MISSING_TARGET_COLUMN");
        assert!(error.is_input_error());
    }

    #[test]
    fn test_io_error_is_not_input_error() {
        let error = FeatureError::Io(std::io::Error::other("disk"));
        assert!(!error.is_input_error());
    }
}
