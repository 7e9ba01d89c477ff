//! `ccdefault predict`: fit the interactive model on the training table and
//! classify one applicant.
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use ccdefault_classifiers::config::{ModelConfig, ModelType};
use ccdefault_classifiers::gateway::Verdict;
use ccdefault_classifiers::io::{read_training_table, TableReaderConfig};
use ccdefault_classifiers::pipeline::train_interactive_model;
use ccdefault_classifiers::schema::{ApplicantProfile, Education, Gender, MaritalStatus, Record};

use crate::util::load_json_config;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    pub model: ModelConfig,
    pub decode_codes: bool,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::new(ModelType::ensemble()),
            decode_codes: true,
        }
    }
}

impl PredictConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: PredictConfig = match config_path {
            Some(path) => load_json_config(path)?,
            None => PredictConfig::default(),
        };

        if let Some(model_type) = matches.get_one::<String>("model_type") {
            let model_type = ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
            config.model = ModelConfig::new(model_type)
                .with_decision_threshold(config.model.decision_threshold);
        }
        if matches.get_flag("raw_codes") {
            config.decode_codes = false;
        }
        Ok(config)
    }
}

/// Build the applicant from the form arguments.
pub fn profile_from_arguments(matches: &ArgMatches) -> Result<ApplicantProfile> {
    let text = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .cloned()
            .with_context(|| format!("Missing --{}", name.replace('_', "-")))
    };
    let number = |name: &str| -> Result<f64> {
        matches
            .get_one::<f64>(name)
            .copied()
            .with_context(|| format!("Missing --{}", name.replace('_', "-")))
    };

    Ok(ApplicantProfile {
        gender: Gender::from_str(&text("gender")?)?,
        education: Education::from_str(&text("education")?)?,
        marital_status: MaritalStatus::from_str(&text("marital_status")?)?,
        age: number("age")?,
        credit_limit: number("credit_limit")?,
        bill_amount: number("bill_amount")?,
        payment_amount: number("payment_amount")?,
    })
}

/// Verdict and default probability for one applicant.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub verdict: Verdict,
    pub probability: f64,
}

pub fn run_prediction(
    table: &Path,
    profile: &ApplicantProfile,
    config: &PredictConfig,
) -> Result<Prediction> {
    let dataset = read_training_table(
        table,
        &TableReaderConfig {
            decode_codes: config.decode_codes,
        },
    )?;
    dataset.log_input_data_summary();

    let gateway = train_interactive_model(&dataset, &config.model)
        .context("Failed to train the interactive model")?;

    let record = if config.decode_codes {
        Record::from(profile)
    } else {
        profile.to_coded_record()
    };
    let probability = gateway.default_probability(&record)?;
    let verdict = gateway.predict_single(&record)?;
    Ok(Prediction {
        verdict,
        probability,
    })
}
