//! Single-record inference for the interactive form.
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::models::trained::{ClassifierState, TrainedModel};
use crate::schema::{ApplicantProfile, Record, Schema};

/// Binary decision returned to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Default,
    NoDefault,
}

impl Verdict {
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Verdict::Default
        } else {
            Verdict::NoDefault
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Default => "Default",
            Verdict::NoDefault => "No Default",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers single requests against a shared, frozen model fitted on the
/// reduced schema. Cloning the gateway shares the model.
#[derive(Debug, Clone)]
pub struct InferenceGateway {
    model: Arc<TrainedModel>,
}

impl InferenceGateway {
    pub fn new(model: Arc<TrainedModel>) -> Result<Self> {
        if model.schema() != Schema::Reduced {
            return Err(PipelineError::schema(
                "schema",
                format!(
                    "inference gateway needs a model fitted on the reduced schema, got {}",
                    model.schema()
                ),
            ));
        }
        Ok(Self { model })
    }

    pub fn from_state(state: &ClassifierState) -> Result<Self> {
        Self::new(Arc::clone(state.trained()?))
    }

    /// Probability that the applicant described by `record` defaults.
    pub fn default_probability(&self, record: &Record) -> Result<f64> {
        record.check_conforms(Schema::Reduced)?;
        self.model.predict_proba_one(record)
    }

    pub fn predict_single(&self, record: &Record) -> Result<Verdict> {
        let p = self.default_probability(record)?;
        let verdict = Verdict::from_label(self.model.label(p));
        log::debug!("Default probability {:.4} -> {}", p, verdict);
        Ok(verdict)
    }

    pub fn predict_profile(&self, profile: &ApplicantProfile) -> Result<Verdict> {
        self.predict_single(&Record::from(profile))
    }
}
