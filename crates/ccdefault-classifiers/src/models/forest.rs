//! Random forest over `smartcore` decision trees.
//!
//! Every tree is fitted on its own bootstrap resample, restricted to a random
//! subset of the feature columns. The default probability of a row is the
//! share of trees that vote for class 1.
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};

use crate::config::{MaxFeatures, ModelConfig, ModelType};
use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{
    check_training_input, check_width, ClassifierModel, FittedClassifier,
};

type Tree = DecisionTreeClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    max_features: MaxFeatures,
    bootstrap: bool,
    seed: u64,
}

impl RandomForest {
    pub fn new(params: &ModelConfig) -> Result<Self> {
        match &params.model_type {
            ModelType::Ensemble {
                n_trees,
                max_depth,
                min_samples_split,
                max_features,
                bootstrap,
                seed,
            } => Ok(RandomForest {
                n_trees: *n_trees,
                max_depth: *max_depth,
                min_samples_split: *min_samples_split,
                max_features: *max_features,
                bootstrap: *bootstrap,
                seed: *seed,
            }),
            other => Err(PipelineError::InvalidParameter(format!(
                "expected ModelType::Ensemble params, got {}",
                other.name()
            ))),
        }
    }

    fn tree_parameters(&self) -> Result<DecisionTreeClassifierParameters> {
        let mut params = DecisionTreeClassifierParameters::default()
            .with_criterion(SplitCriterion::Gini)
            .with_min_samples_split(self.min_samples_split);
        if let Some(depth) = self.max_depth {
            let depth = u16::try_from(depth).map_err(|_| {
                PipelineError::InvalidParameter(format!("max_depth {} is too large", depth))
            })?;
            params = params.with_max_depth(depth);
        }
        Ok(params)
    }
}

/// Copy the selected rows and columns of `x` into a smartcore matrix.
fn dense_matrix(x: &Array2<f64>, rows: &[usize], columns: &[usize]) -> DenseMatrix<f64> {
    let values: Vec<Vec<f64>> = rows
        .iter()
        .map(|&r| {
            let row = x.row_slice(r);
            columns.iter().map(|&c| row[c]).collect()
        })
        .collect();
    DenseMatrix::from_2d_vec(&values)
}

impl ClassifierModel for RandomForest {
    fn fit(&self, x: &Array2<f64>, y: &[u8]) -> Result<Box<dyn FittedClassifier>> {
        check_training_input(x, y)?;
        let (n_samples, n_features) = x.shape();
        let k = self.max_features.resolve(n_features);
        let params = self.tree_parameters()?;
        log::debug!(
            "Growing {} trees on {} samples, {} of {} features per tree",
            self.n_trees,
            n_samples,
            k,
            n_features
        );

        let mut members = Vec::with_capacity(self.n_trees);
        for t in 0..self.n_trees {
            // Each tree owns its stream so the forest does not depend on the
            // order trees are grown in.
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
            let rows: Vec<usize> = if self.bootstrap {
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
            } else {
                (0..n_samples).collect()
            };
            let mut features = if k < n_features {
                index::sample(&mut rng, n_features, k).into_vec()
            } else {
                (0..n_features).collect()
            };
            features.sort_unstable();

            let labels: Vec<u32> = rows.iter().map(|&r| u32::from(y[r])).collect();
            let member = if labels.iter().all(|&l| l == labels[0]) {
                // A single-class resample has nothing to split on.
                Member::Constant(labels[0] as u8)
            } else {
                let tree = Tree::fit(&dense_matrix(x, &rows, &features), &labels, params.clone())
                    .map_err(|e| PipelineError::FitFailed(format!("tree {}: {}", t, e)))?;
                Member::Tree { features, tree }
            };
            log::trace!("tree {}: {:?}", t, member);
            members.push(member);
        }

        Ok(Box::new(FittedRandomForest {
            members,
            n_features,
        }))
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

enum Member {
    Constant(u8),
    Tree { features: Vec<usize>, tree: Tree },
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Constant(class) => write!(f, "constant {}", class),
            Member::Tree { features, .. } => write!(f, "tree on features {:?}", features),
        }
    }
}

impl Member {
    fn votes(&self, x: &Array2<f64>, all_rows: &[usize]) -> Result<Vec<u32>> {
        match self {
            Member::Constant(class) => Ok(vec![u32::from(*class); all_rows.len()]),
            Member::Tree { features, tree } => tree
                .predict(&dense_matrix(x, all_rows, features))
                .map_err(|e| PipelineError::FitFailed(e.to_string())),
        }
    }
}

pub struct FittedRandomForest {
    members: Vec<Member>,
    n_features: usize,
}

impl fmt::Debug for FittedRandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedRandomForest")
            .field("n_trees", &self.members.len())
            .field("n_features", &self.n_features)
            .finish()
    }
}

impl FittedClassifier for FittedRandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        check_width(self.n_features, x)?;
        if x.is_empty() {
            return Ok(Vec::new());
        }
        let all_rows: Vec<usize> = (0..x.nrows()).collect();
        let mut votes = vec![0u32; x.nrows()];
        for member in &self.members {
            for (count, vote) in votes.iter_mut().zip(member.votes(x, &all_rows)?) {
                *count += vote;
            }
        }
        let n_trees = self.members.len() as f64;
        Ok(votes.into_iter().map(|v| f64::from(v) / n_trees).collect())
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_forest(n_trees: usize, seed: u64) -> ModelConfig {
        ModelConfig::new(ModelType::Ensemble {
            n_trees,
            max_depth: Some(4),
            min_samples_split: 2,
            max_features: MaxFeatures::All,
            bootstrap: true,
            seed,
        })
    }

    fn blobs() -> (Array2<f64>, Vec<u8>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.1;
            data.extend_from_slice(&[1.0 + jitter, 2.0 - jitter]);
            y.push(0);
            data.extend_from_slice(&[5.0 + jitter, 7.0 - jitter]);
            y.push(1);
        }
        (Array2::from_shape_vec((40, 2), data).unwrap(), y)
    }

    #[test]
    fn separates_well_apart_clusters() {
        let (x, y) = blobs();
        let fitted = RandomForest::new(&small_forest(15, 7))
            .unwrap()
            .fit(&x, &y)
            .unwrap();
        assert_eq!(fitted.predict(&x).unwrap(), y);
    }

    #[test]
    fn probabilities_are_vote_shares() {
        let (x, y) = blobs();
        let fitted = RandomForest::new(&small_forest(8, 1))
            .unwrap()
            .fit(&x, &y)
            .unwrap();
        for p in fitted.predict_proba(&x).unwrap() {
            assert!((0.0..=1.0).contains(&p));
            let scaled = p * 8.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = blobs();
        let model = RandomForest::new(&small_forest(5, 11)).unwrap();
        let query = Array2::from_shape_vec((2, 2), vec![3.0, 4.0, 2.5, 5.5]).unwrap();
        let a = model.fit(&x, &y).unwrap().predict_proba(&query).unwrap();
        let b = model.fit(&x, &y).unwrap().predict_proba(&query).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn feature_subsets_still_separate_redundant_columns() {
        // Both columns carry the class, so any one-column tree separates it.
        let (x, y) = blobs();
        let config = ModelConfig::new(ModelType::Ensemble {
            n_trees: 11,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Count(1),
            bootstrap: true,
            seed: 5,
        });
        let fitted = RandomForest::new(&config).unwrap().fit(&x, &y).unwrap();
        assert_eq!(fitted.predict(&x).unwrap(), y);
    }

    #[test]
    fn unbounded_depth_on_alternating_labels_completes() {
        let n = 6000;
        let x = Array2::from_shape_vec((n, 1), (0..n).map(|i| i as f64).collect()).unwrap();
        let y: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
        let config = ModelConfig::new(ModelType::Ensemble {
            n_trees: 1,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::All,
            bootstrap: false,
            seed: 0,
        });
        let fitted = RandomForest::new(&config).unwrap().fit(&x, &y).unwrap();
        assert_eq!(fitted.predict(&x).unwrap(), y);
    }

    #[test]
    fn single_class_training_votes_for_that_class() {
        let (x, _) = blobs();
        let fitted = RandomForest::new(&small_forest(4, 2))
            .unwrap()
            .fit(&x, &[0; 40])
            .unwrap();
        assert_eq!(fitted.predict_proba(&x).unwrap(), vec![0.0; 40]);
    }

    #[test]
    fn oversized_depth_is_rejected() {
        let config = ModelConfig::new(ModelType::Ensemble {
            n_trees: 1,
            max_depth: Some(usize::from(u16::MAX) + 1),
            min_samples_split: 2,
            max_features: MaxFeatures::All,
            bootstrap: false,
            seed: 0,
        });
        let (x, y) = blobs();
        let err = RandomForest::new(&config).unwrap().fit(&x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_linear_params() {
        assert!(RandomForest::new(&ModelConfig::default()).is_err());
    }
}
