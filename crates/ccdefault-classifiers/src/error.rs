//! Error taxonomy shared by every stage of the classification pipeline.
//!
//! Errors are raised at the point of detection and handed back to the
//! caller untouched; nothing in the crate retries or substitutes defaults.
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A record or table is missing a required field, or carries one the
    /// schema does not know about.
    #[error("schema mismatch on field '{field}': {reason}")]
    SchemaMismatch { field: String, reason: String },

    /// A categorical value that was never observed when the code map was fitted.
    #[error("unknown category '{value}' for field '{field}'")]
    UnknownCategory { field: String, value: String },

    /// Prediction was requested from a classifier that has not been fitted.
    #[error("classifier has not been fitted")]
    NotFitted,

    /// Empty or single-class inputs where two classes are required.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Feature width or sequence length disagrees with what was fitted.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The underlying learner rejected the training data.
    #[error("model fitting failed: {0}")]
    FitFailed(String),

    /// Labels must be 0 (no default) or 1 (default).
    #[error("invalid label {value} at index {index}; expected 0 or 1")]
    InvalidLabel { index: usize, value: i64 },
}

impl PipelineError {
    pub(crate) fn schema(field: &str, reason: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_category(field: &str, value: &str) -> Self {
        PipelineError::UnknownCategory {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Check that every label is 0 or 1.
pub(crate) fn validate_labels(labels: &[u8]) -> Result<()> {
    match labels.iter().position(|&l| l > 1) {
        Some(index) => Err(PipelineError::InvalidLabel {
            index,
            value: labels[index] as i64,
        }),
        None => Ok(()),
    }
}
