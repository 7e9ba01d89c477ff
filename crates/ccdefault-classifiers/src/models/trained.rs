//! The trained classifier bundle and its fit/unfit state.
//!
//! A `TrainedModel` owns everything a prediction depends on: the schema the
//! model was fitted on, the categorical code map, the optional scaler and
//! the fitted classifier. It is built once by `TrainedModel::fit` and is
//! read-only afterwards.
use std::fmt;
use std::sync::Arc;

use crate::config::ModelConfig;
use crate::data_handling::LabeledDataset;
use crate::encoding::{encode_all, CategoricalCodeMap};
use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{label_at, FittedClassifier};
use crate::models::factory::build_model;
use crate::preprocessing::{fit_transform, transform_all, Scaler};
use crate::schema::{Record, Schema};

pub struct TrainedModel {
    schema: Schema,
    codes: CategoricalCodeMap,
    scaler: Option<Scaler>,
    classifier: Box<dyn FittedClassifier>,
    config: ModelConfig,
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("schema", &self.schema)
            .field("classifier", &self.classifier.name())
            .field("scaled", &self.scaler.is_some())
            .field("decision_threshold", &self.config.decision_threshold)
            .finish()
    }
}

impl TrainedModel {
    /// Fit the code map, the scaler (when `config.scale_features`) and the
    /// classifier on `dataset`, all against `schema`.
    pub fn fit(dataset: &LabeledDataset, schema: Schema, config: &ModelConfig) -> Result<Self> {
        let model = build_model(config)?;

        let codes = CategoricalCodeMap::fit(&dataset.records, schema)?;
        for field in codes.field_names() {
            log::debug!("{} codes: {:?}", field, codes.categories(field).unwrap_or_default());
        }
        let x = encode_all(&dataset.records, schema, &codes)?;
        let (scaler, x) = if config.scale_features {
            let (scaler, scaled) = fit_transform(&x)?;
            (Some(scaler), scaled)
        } else {
            (None, x)
        };

        let classifier = model.fit(&x, &dataset.labels)?;
        log::info!(
            "Fitted {} on {} records ({} schema, {} features, scaled: {})",
            classifier.name(),
            dataset.len(),
            schema,
            schema.width(),
            scaler.is_some()
        );

        Ok(TrainedModel {
            schema,
            codes,
            scaler,
            classifier,
            config: config.clone(),
        })
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.scaler.as_ref()
    }

    pub fn classifier(&self) -> &dyn FittedClassifier {
        self.classifier.as_ref()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Encode (and scale, if the model was fitted on scaled features)
    /// `records` exactly as the training records were.
    pub fn features(&self, records: &[Record]) -> Result<Array2<f64>> {
        let x = encode_all(records, self.schema, &self.codes)?;
        match &self.scaler {
            Some(scaler) => transform_all(&x, scaler),
            None => Ok(x),
        }
    }

    /// Default probability of each record.
    pub fn predict_proba(&self, records: &[Record]) -> Result<Vec<f64>> {
        let x = self.features(records)?;
        self.classifier.predict_proba(&x)
    }

    /// 0/1 prediction of each record at the configured decision threshold.
    pub fn predict(&self, records: &[Record]) -> Result<Vec<u8>> {
        let x = self.features(records)?;
        self.classifier
            .predict_with_threshold(&x, self.config.decision_threshold)
    }

    /// Class of an already computed default probability.
    pub fn label(&self, probability: f64) -> u8 {
        label_at(probability, self.config.decision_threshold)
    }

    pub fn predict_proba_one(&self, record: &Record) -> Result<f64> {
        let probabilities = self.predict_proba(std::slice::from_ref(record))?;
        probabilities
            .first()
            .copied()
            .ok_or(PipelineError::DimensionMismatch {
                expected: 1,
                found: 0,
            })
    }
}

/// A classifier that is either waiting to be fitted or holds a frozen
/// `TrainedModel`.
///
/// `fit` consumes nothing and always returns a new `Fitted` state, so a
/// second fit never disturbs a model that is already serving predictions.
#[derive(Debug, Clone)]
pub enum ClassifierState {
    Unfitted { config: ModelConfig, schema: Schema },
    Fitted(Arc<TrainedModel>),
}

impl ClassifierState {
    pub fn new(config: ModelConfig, schema: Schema) -> Self {
        ClassifierState::Unfitted { config, schema }
    }

    pub fn fit(&self, dataset: &LabeledDataset) -> Result<ClassifierState> {
        let (config, schema) = match self {
            ClassifierState::Unfitted { config, schema } => (config, *schema),
            ClassifierState::Fitted(model) => (model.config(), model.schema()),
        };
        let model = TrainedModel::fit(dataset, schema, config)?;
        Ok(ClassifierState::Fitted(Arc::new(model)))
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, ClassifierState::Fitted(_))
    }

    /// The trained bundle, or `NotFitted`.
    pub fn trained(&self) -> Result<&Arc<TrainedModel>> {
        match self {
            ClassifierState::Fitted(model) => Ok(model),
            ClassifierState::Unfitted { .. } => Err(PipelineError::NotFitted),
        }
    }

    pub fn predict(&self, records: &[Record]) -> Result<Vec<u8>> {
        self.trained()?.predict(records)
    }

    pub fn predict_proba(&self, records: &[Record]) -> Result<Vec<f64>> {
        self.trained()?.predict_proba(records)
    }
}
