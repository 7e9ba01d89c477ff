//! End-to-end workflows built from the pipeline stages.
use std::sync::Arc;

use serde::Serialize;

use crate::config::ModelConfig;
use crate::data_handling::LabeledDataset;
use crate::error::Result;
use crate::gateway::InferenceGateway;
use crate::metrics::{evaluate, Metrics};
use crate::models::trained::TrainedModel;
use crate::schema::Schema;

/// Settings of a holdout evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldoutConfig {
    pub model: ModelConfig,
    pub schema: Schema,
    pub holdout_fraction: f64,
    pub seed: u64,
}

impl Default for HoldoutConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            schema: Schema::Full,
            holdout_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Outcome of `run_holdout_evaluation`.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub model: String,
    pub schema: Schema,
    pub n_train: usize,
    pub n_holdout: usize,
    pub metrics: Metrics,
}

/// Split `dataset`, fit on the training partition only and score the
/// holdout partition.
///
/// The code map and scaling statistics never see holdout rows, so a
/// category that only occurs in the holdout partition surfaces as
/// `UnknownCategory`.
pub fn run_holdout_evaluation(
    dataset: &LabeledDataset,
    config: &HoldoutConfig,
) -> Result<EvaluationReport> {
    dataset.log_input_data_summary();
    let projected;
    let dataset = match config.schema {
        Schema::Full => dataset,
        Schema::Reduced => {
            projected = dataset.project(Schema::Reduced)?;
            &projected
        }
    };

    let (train, holdout) = dataset.split(config.holdout_fraction, config.seed)?;
    let model = TrainedModel::fit(&train, config.schema, &config.model)?;

    let x_holdout = model.features(&holdout.records)?;
    let y_proba = model.classifier().predict_proba(&x_holdout)?;
    let y_pred: Vec<u8> = y_proba.iter().map(|&p| model.label(p)).collect();
    let metrics = evaluate(&holdout.labels, &y_pred, &y_proba)?;

    Ok(EvaluationReport {
        model: model.classifier().name().to_string(),
        schema: config.schema,
        n_train: train.len(),
        n_holdout: holdout.len(),
        metrics,
    })
}

/// Fit the interactive model: every record projected onto the reduced
/// schema, no holdout.
pub fn train_interactive_model(
    dataset: &LabeledDataset,
    model_config: &ModelConfig,
) -> Result<InferenceGateway> {
    let reduced = dataset.project(Schema::Reduced)?;
    let model = TrainedModel::fit(&reduced, Schema::Reduced, model_config)?;
    InferenceGateway::new(Arc::new(model))
}
