use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Probability above which a record is classified as a default.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_threshold")]
    pub decision_threshold: f64,

    /// Standardize features with training-partition statistics before fitting.
    pub scale_features: bool,

    #[serde(flatten)]
    pub model_type: ModelType,
}

fn default_threshold() -> f64 {
    DEFAULT_DECISION_THRESHOLD
}

/// How many feature columns each ensemble tree is grown on.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Count(usize),
}

impl MaxFeatures {
    /// Number of candidate features out of `n_features`, at least one.
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Count(k) => *k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    /// L2-penalised logistic regression.
    Linear {
        max_iter: u64,
        /// Gradient norm at which the optimizer stops.
        tol: f64,
        l2_penalty: f64,
    },
    /// Random forest of decision trees grown on bootstrap resamples.
    Ensemble {
        n_trees: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
        max_features: MaxFeatures,
        bootstrap: bool,
        seed: u64,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::linear()
    }
}

impl ModelType {
    pub fn linear() -> Self {
        ModelType::Linear {
            max_iter: 100,
            tol: 1e-4,
            l2_penalty: 1.0,
        }
    }

    pub fn ensemble() -> Self {
        ModelType::Ensemble {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelType::Linear { .. } => "linear",
            ModelType::Ensemble { .. } => "ensemble",
        }
    }

    /// Whether this strategy is fitted on standardized features by default.
    pub fn scales_by_default(&self) -> bool {
        matches!(self, ModelType::Linear { .. })
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" | "logistic" => Ok(ModelType::linear()),
            "ensemble" | "forest" | "random_forest" => Ok(ModelType::ensemble()),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: linear, ensemble",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            scale_features: model_type.scales_by_default(),
            model_type,
        }
    }

    pub fn with_decision_threshold(mut self, threshold: f64) -> Self {
        self.decision_threshold = threshold;
        self
    }

    /// Reject hyper-parameters no model could be fitted with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(PipelineError::InvalidParameter(format!(
                "decision_threshold must be in [0, 1], got {}",
                self.decision_threshold
            )));
        }
        match &self.model_type {
            ModelType::Linear {
                max_iter,
                tol,
                l2_penalty,
            } => {
                if *max_iter == 0 || !(*tol > 0.0) || !(*l2_penalty >= 0.0) {
                    return Err(PipelineError::InvalidParameter(format!(
                        "linear model needs max_iter > 0, tol > 0 and l2_penalty >= 0; got {:?}",
                        self.model_type
                    )));
                }
            }
            ModelType::Ensemble {
                n_trees,
                max_depth,
                min_samples_split,
                ..
            } => {
                if *n_trees == 0 || *min_samples_split < 2 || *max_depth == Some(0) {
                    return Err(PipelineError::InvalidParameter(format!(
                        "ensemble needs n_trees > 0, min_samples_split >= 2 and max_depth > 0; got {:?}",
                        self.model_type
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::new(ModelType::default())
    }
}
