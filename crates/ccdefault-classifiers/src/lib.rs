//! ccdefault-classifiers: credit-card default classification pipeline.
//!
//! Records are encoded with a fitted categorical code map, optionally
//! standardized, and fed to a logistic regression or a random forest. The
//! fitted bundle backs both holdout evaluation and the single-record
//! inference gateway used by the interactive form.
pub mod config;
pub mod data_handling;
pub mod encoding;
pub mod error;
pub mod gateway;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod schema;

pub use error::{PipelineError, Result};
