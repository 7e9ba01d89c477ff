//! `ccdefault evaluate`: holdout evaluation of a classifier on the
//! training table.
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use ccdefault_classifiers::config::{ModelConfig, ModelType};
use ccdefault_classifiers::io::{read_training_table, TableReaderConfig};
use ccdefault_classifiers::pipeline::{run_holdout_evaluation, EvaluationReport, HoldoutConfig};
use ccdefault_classifiers::schema::Schema;

use crate::util::{load_json_config, write_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateConfig {
    pub model: ModelConfig,
    /// Evaluate on all 23 attributes (`full`) or the 7 form fields (`reduced`).
    pub schema: Schema,
    pub holdout_fraction: f64,
    pub seed: u64,
    pub decode_codes: bool,
    /// Where to write the metrics as JSON.
    pub metrics_output: Option<PathBuf>,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            schema: Schema::Full,
            holdout_fraction: 0.2,
            seed: 42,
            decode_codes: true,
            metrics_output: None,
        }
    }
}

impl EvaluateConfig {
    /// Load the config file (when given) and apply command-line overrides.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: EvaluateConfig = match config_path {
            Some(path) => load_json_config(path)?,
            None => EvaluateConfig::default(),
        };

        if let Some(model_type) = matches.get_one::<String>("model_type") {
            let model_type = ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
            config.model = ModelConfig::new(model_type)
                .with_decision_threshold(config.model.decision_threshold);
        }
        if let Some(fraction) = matches.get_one::<f64>("holdout") {
            config.holdout_fraction = *fraction;
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.seed = *seed;
        }
        if matches.get_flag("reduced") {
            config.schema = Schema::Reduced;
        }
        if matches.get_flag("raw_codes") {
            config.decode_codes = false;
        }
        if let Some(output) = matches.get_one::<PathBuf>("metrics_output") {
            config.metrics_output = Some(output.clone());
        }

        Ok(config)
    }
}

/// Read `table`, run the holdout evaluation and write the metrics JSON if
/// requested.
pub fn run_evaluation(table: &Path, config: &EvaluateConfig) -> Result<EvaluationReport> {
    let dataset = read_training_table(
        table,
        &TableReaderConfig {
            decode_codes: config.decode_codes,
        },
    )?;

    let holdout = HoldoutConfig {
        model: config.model.clone(),
        schema: config.schema,
        holdout_fraction: config.holdout_fraction,
        seed: config.seed,
    };
    let report = run_holdout_evaluation(&dataset, &holdout)
        .with_context(|| format!("Holdout evaluation of {} failed", table.display()))?;

    if let Some(path) = &config.metrics_output {
        write_json(path, &report)?;
        log::info!("Wrote metrics to {}", path.display());
    }
    Ok(report)
}
