use crate::config::{ModelConfig, ModelType};
use crate::error::Result;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::forest::RandomForest;
use crate::models::linear::LogisticRegression;

/// Build a boxed, unfitted classifier from a `ModelConfig`.
/// The config is validated first, so invalid hyper-parameters surface here
/// rather than halfway through training.
pub fn build_model(params: &ModelConfig) -> Result<Box<dyn ClassifierModel>> {
    params.validate()?;
    let model: Box<dyn ClassifierModel> = match params.model_type {
        ModelType::Linear { .. } => Box::new(LogisticRegression::new(params)?),
        ModelType::Ensemble { .. } => Box::new(RandomForest::new(params)?),
    };
    log::debug!("Built {} model", model.name());
    Ok(model)
}
