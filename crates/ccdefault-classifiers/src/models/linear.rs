//! L2-penalised logistic regression backed by `linfa-logistic`.
use std::fmt;

use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::FittedLogisticRegression as LinfaFitted;
use ndarray::Array1;

use crate::config::{ModelConfig, ModelType};
use crate::error::{PipelineError, Result};
use crate::math::{to_ndarray, Array2};
use crate::models::classifier_trait::{
    check_training_input, check_width, ClassifierModel, FittedClassifier,
};

/// Logistic regression hyper-parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    max_iter: u64,
    tol: f64,
    l2_penalty: f64,
}

impl LogisticRegression {
    pub fn new(params: &ModelConfig) -> Result<Self> {
        match &params.model_type {
            ModelType::Linear {
                max_iter,
                tol,
                l2_penalty,
            } => Ok(LogisticRegression {
                max_iter: *max_iter,
                tol: *tol,
                l2_penalty: *l2_penalty,
            }),
            other => Err(PipelineError::InvalidParameter(format!(
                "expected ModelType::Linear params, got {}",
                other.name()
            ))),
        }
    }
}

impl ClassifierModel for LogisticRegression {
    fn fit(&self, x: &Array2<f64>, y: &[u8]) -> Result<Box<dyn FittedClassifier>> {
        check_training_input(x, y)?;
        let n_features = x.ncols();

        // The learner needs both classes; a single-class partition always
        // predicts that class.
        if let Some(&only) = y.first().filter(|&&first| y.iter().all(|&l| l == first)) {
            log::warn!(
                "Training labels hold only class {}; the linear model will always predict it",
                only
            );
            return Ok(Box::new(FittedLogisticRegression {
                state: LinearState::Constant(only),
                n_features,
            }));
        }

        let targets: Array1<usize> = y.iter().map(|&l| usize::from(l)).collect();
        let dataset = Dataset::new(to_ndarray(x)?, targets);
        let model = linfa_logistic::LogisticRegression::<f64>::default()
            .alpha(self.l2_penalty)
            .max_iterations(self.max_iter)
            .gradient_tolerance(self.tol)
            .with_intercept(true)
            .fit(&dataset)
            .map_err(|e| PipelineError::FitFailed(e.to_string()))?;

        log::debug!(
            "Logistic regression fitted: intercept {:.4}, coefficients {:?}",
            model.intercept(),
            model.params().to_vec()
        );

        Ok(Box::new(FittedLogisticRegression {
            state: LinearState::Fitted(model),
            n_features,
        }))
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

enum LinearState {
    Constant(u8),
    Fitted(LinfaFitted<f64, usize>),
}

/// A fitted logistic regression.
pub struct FittedLogisticRegression {
    state: LinearState,
    n_features: usize,
}

impl fmt::Debug for FittedLogisticRegression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("FittedLogisticRegression");
        match &self.state {
            LinearState::Constant(class) => out.field("constant", class),
            LinearState::Fitted(model) => out
                .field("intercept", &model.intercept())
                .field("coefficients", &model.params().to_vec()),
        };
        out.field("n_features", &self.n_features).finish()
    }
}

impl FittedClassifier for FittedLogisticRegression {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        check_width(self.n_features, x)?;
        match &self.state {
            LinearState::Constant(class) => Ok(vec![f64::from(*class); x.nrows()]),
            // Labels are sorted, so the positive class of the learner is 1.
            LinearState::Fitted(model) => {
                Ok(model.predict_probabilities(&to_ndarray(x)?).to_vec())
            }
        }
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Array2<f64>, Vec<u8>) {
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                -2.0, 0.1, -1.5, -0.3, -1.0, 0.2, -0.5, -0.1, //
                0.5, 0.3, 1.0, -0.2, 1.5, 0.1, 2.0, 0.0,
            ],
        )
        .unwrap();
        (x, vec![0, 0, 0, 0, 1, 1, 1, 1])
    }

    #[test]
    fn learns_a_separable_boundary() {
        let (x, y) = separable();
        let model = LogisticRegression::new(&ModelConfig::default()).unwrap();
        let fitted = model.fit(&x, &y).unwrap();
        assert_eq!(fitted.predict(&x).unwrap(), y);
        for p in fitted.predict_proba(&x).unwrap() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn probability_rises_with_the_positive_feature() {
        let (x, y) = separable();
        let fitted = LogisticRegression::new(&ModelConfig::default())
            .unwrap()
            .fit(&x, &y)
            .unwrap();
        let grid = Array2::from_shape_vec((3, 2), vec![-3.0, 0.0, 0.0, 0.0, 3.0, 0.0]).unwrap();
        let p = fitted.predict_proba(&grid).unwrap();
        assert!(p[0] < p[1] && p[1] < p[2], "{:?}", p);
    }

    #[test]
    fn refitting_yields_identical_independent_models() {
        let (x, y) = separable();
        let model = LogisticRegression::new(&ModelConfig::default()).unwrap();
        let a = model.fit(&x, &y).unwrap();
        let b = model.fit(&x, &y).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn single_class_labels_give_a_constant_model() {
        let (x, _) = separable();
        let fitted = LogisticRegression::new(&ModelConfig::default())
            .unwrap()
            .fit(&x, &[0; 8])
            .unwrap();
        assert_eq!(fitted.predict_proba(&x).unwrap(), vec![0.0; 8]);
        assert!(format!("{:?}", fitted).contains("constant"));
    }

    #[test]
    fn rejects_wrong_width_at_prediction() {
        let (x, y) = separable();
        let fitted = LogisticRegression::new(&ModelConfig::default())
            .unwrap()
            .fit(&x, &y)
            .unwrap();
        let narrow = Array2::from_shape_vec((1, 1), vec![0.0]).unwrap();
        assert_eq!(
            fitted.predict_proba(&narrow),
            Err(PipelineError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn rejects_ensemble_params() {
        let cfg = ModelConfig::new(ModelType::ensemble());
        assert!(LogisticRegression::new(&cfg).is_err());
    }
}
