use std::fmt;

use crate::config::DEFAULT_DECISION_THRESHOLD;
use crate::error::{validate_labels, PipelineError, Result};
use crate::math::Array2;

/// An unfitted estimator: hyper-parameters only.
///
/// `fit` never mutates the estimator. Every call produces a fresh,
/// independent fitted model, so fitting twice cannot leave a half-trained
/// state behind.
pub trait ClassifierModel {
    /// Fit on feature rows `x` and binary labels `y` (1 = default).
    fn fit(&self, x: &Array2<f64>, y: &[u8]) -> Result<Box<dyn FittedClassifier>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// A frozen, fitted model. Only read access exists, so one instance can be
/// shared across threads for concurrent prediction.
pub trait FittedClassifier: fmt::Debug + Send + Sync {
    /// Width of the feature vectors the model was fitted on.
    fn n_features(&self) -> usize;

    /// Probability of class 1 for each row, in [0, 1].
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>>;

    /// Class labels: 1 where the probability is strictly above `threshold`.
    fn predict_with_threshold(&self, x: &Array2<f64>, threshold: f64) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| label_at(p, threshold))
            .collect())
    }

    /// Class labels at `DEFAULT_DECISION_THRESHOLD`.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        self.predict_with_threshold(x, DEFAULT_DECISION_THRESHOLD)
    }

    fn name(&self) -> &str {
        "classifier"
    }
}

/// Class 1 iff the probability is strictly above `threshold`.
pub fn label_at(probability: f64, threshold: f64) -> u8 {
    u8::from(probability > threshold)
}

/// Shared validation of a training set.
pub(crate) fn check_training_input(x: &Array2<f64>, y: &[u8]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: x.nrows(),
            found: y.len(),
        });
    }
    if x.is_empty() || x.ncols() == 0 {
        return Err(PipelineError::InsufficientData(format!(
            "cannot fit on a {} x {} feature matrix",
            x.nrows(),
            x.ncols()
        )));
    }
    validate_labels(y)
}

/// Feature width of `x` must match what the model was fitted on.
pub(crate) fn check_width(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(PipelineError::DimensionMismatch {
            expected,
            found: x.ncols(),
        });
    }
    Ok(())
}
