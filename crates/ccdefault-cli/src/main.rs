use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use ccdefault_cli::evaluate::{run_evaluation, EvaluateConfig};
use ccdefault_cli::predict::{profile_from_arguments, run_prediction, PredictConfig};
use ccdefault_cli::util::validate_tsv_or_csv_file;

fn table_arg() -> Arg {
    Arg::new("table")
        .help("Path to the labelled credit-card clients table (*.csv or *.tsv)")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to a JSON configuration file")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn model_type_arg() -> Arg {
    Arg::new("model_type")
        .long("model-type")
        .help("Override the model type from the JSON config.")
        .value_parser(["linear", "ensemble"])
        .value_hint(ValueHint::Other)
}

fn raw_codes_arg() -> Arg {
    Arg::new("raw_codes")
        .long("raw-codes")
        .help("Use the integer SEX/EDUCATION/MARRIAGE codes as categories instead of decoding them.")
        .action(ArgAction::SetTrue)
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("CCDEFAULT_LOG", "error,ccdefault=info"))
        .init();

    let matches = Command::new("ccdefault")
        .version(clap::crate_version!())
        .about("Credit-card default classifier: holdout evaluation and single-applicant prediction")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("evaluate")
                .about("Train on a training partition and report metrics on the holdout partition")
                .arg(table_arg())
                .arg(config_arg())
                .arg(model_type_arg())
                .arg(
                    Arg::new("holdout")
                        .long("holdout")
                        .help("Fraction of records held out for evaluation, in (0, 1).")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed of the train/holdout shuffle.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("reduced")
                        .long("reduced")
                        .help("Evaluate on the 7 interactive fields only.")
                        .action(ArgAction::SetTrue),
                )
                .arg(raw_codes_arg())
                .arg(
                    Arg::new("metrics_output")
                        .short('o')
                        .long("output")
                        .help("Path to write the metrics as JSON.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Train the interactive model and classify one applicant")
                .arg(table_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("gender")
                        .long("gender")
                        .help("Male or Female")
                        .required(true),
                )
                .arg(
                    Arg::new("education")
                        .long("education")
                        .help("Graduate School, University, High School or Others")
                        .required(true),
                )
                .arg(
                    Arg::new("marital_status")
                        .long("marital-status")
                        .help("Married, Single or Others")
                        .required(true),
                )
                .arg(number_arg("age", "age", "Age in years"))
                .arg(number_arg("credit_limit", "credit-limit", "Credit limit"))
                .arg(number_arg("bill_amount", "bill-amount", "Last bill amount"))
                .arg(number_arg("payment_amount", "payment-amount", "Last payment amount"))
                .arg(model_type_arg())
                .arg(raw_codes_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("evaluate", sub_m)) => handle_evaluate(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn number_arg(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .help(help)
        .required(true)
        .allow_negative_numbers(true)
        .value_parser(clap::value_parser!(f64))
}

fn handle_evaluate(matches: &ArgMatches) -> Result<()> {
    let table: &PathBuf = matches
        .get_one("table")
        .ok_or_else(|| anyhow::anyhow!("Missing training table"))?;
    validate_tsv_or_csv_file(table)?;
    let config_path = matches.get_one::<PathBuf>("config");

    let config = EvaluateConfig::from_arguments(config_path, matches)?;
    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[ccdefault::evaluate] No config provided; using:\n{}", default_json);
    }

    log::info!("[ccdefault::evaluate] Evaluating on {:?}", table);
    let report = run_evaluation(table, &config)?;
    println!(
        "Model: {} ({} schema), trained on {} records, evaluated on {}\n",
        report.model, report.schema, report.n_train, report.n_holdout
    );
    println!("{}", report.metrics);
    Ok(())
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let table: &PathBuf = matches
        .get_one("table")
        .ok_or_else(|| anyhow::anyhow!("Missing training table"))?;
    validate_tsv_or_csv_file(table)?;
    let config_path = matches.get_one::<PathBuf>("config");

    let config = PredictConfig::from_arguments(config_path, matches)?;
    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[ccdefault::predict] No config provided; using:\n{}", default_json);
    }

    let profile = profile_from_arguments(matches)?;
    let prediction = run_prediction(table, &profile, &config)?;
    log::info!(
        "[ccdefault::predict] Default probability {:.4}",
        prediction.probability
    );
    println!("{}", prediction.verdict);
    Ok(())
}
