use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use categorical_bayes::config::{Overrides, RunConfig};
use categorical_bayes::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use categorical_bayes::{dataset, evaluate, predict, BayesModel, Prediction, Stats};

/// Train, apply and evaluate a categorical Naive Bayes classifier
#[derive(Parser)]
#[command(name = "bayes", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// TOML file with label/id/ignored/missing settings
    #[arg(long, global = true, env = "BAYES_CONFIG")]
    config: Option<PathBuf>,

    /// Label column
    #[arg(long, global = true)]
    label: Option<String>,

    /// Row identity column of test and keys files
    #[arg(long, global = true)]
    id: Option<String>,

    /// Columns to leave out of the model
    #[arg(long, global = true, value_delimiter = ',')]
    ignore: Option<Vec<String>>,

    /// Tokens marking a missing value
    #[arg(long, global = true, value_delimiter = ',')]
    missing: Option<Vec<String>>,

    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,

    #[arg(long, global = true, env = "BAYES_LOG_FORMAT", default_value = "human")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Build a model from training data and save it as JSON
    Train {
        #[arg(long)]
        train: PathBuf,
        #[arg(long, default_value = "model.json")]
        model_out: PathBuf,
    },
    /// Classify test rows with a saved model
    Predict {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        test: PathBuf,
        #[arg(long, default_value = "predictions.csv")]
        out: PathBuf,
    },
    /// Classify test rows with a saved model and score them against keys
    Evaluate {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        test: PathBuf,
        #[arg(long)]
        keys: PathBuf,
        #[arg(long, default_value = "stats.json")]
        stats_out: PathBuf,
    },
    /// Train, predict and evaluate in one go
    Run {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        test: PathBuf,
        #[arg(long)]
        keys: PathBuf,
        #[arg(long, default_value = "model.json")]
        model_out: PathBuf,
        #[arg(long, default_value = "predictions.csv")]
        predictions_out: PathBuf,
        #[arg(long, default_value = "stats.json")]
        stats_out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig {
        format: cli.global.log_format,
        level: cli.global.log_level,
    });

    let config = RunConfig::load(
        cli.global.config.as_deref(),
        Overrides {
            label_column: cli.global.label,
            id_column: cli.global.id,
            ignored_columns: cli.global.ignore,
            missing_values: cli.global.missing,
        },
    )?;

    match cli.command {
        Command::Train { train, model_out } => {
            let model = train_model(&config, &train)?;
            save_model(&model, &model_out)?;
        }
        Command::Predict { model, test, out } => {
            let model = dataset::read_model(&model)?;
            let predictions = predict_file(&config, &model, &test)?;
            save_predictions(&config, &predictions, &out)?;
        }
        Command::Evaluate {
            model,
            test,
            keys,
            stats_out,
        } => {
            let model = dataset::read_model(&model)?;
            let predictions = predict_file(&config, &model, &test)?;
            let stats = evaluate_file(&config, &predictions, &keys)?;
            save_stats(&stats, &stats_out)?;
        }
        Command::Run {
            train,
            test,
            keys,
            model_out,
            predictions_out,
            stats_out,
        } => {
            let model = train_model(&config, &train)?;
            save_model(&model, &model_out)?;
            let predictions = predict_file(&config, &model, &test)?;
            save_predictions(&config, &predictions, &predictions_out)?;
            let stats = evaluate_file(&config, &predictions, &keys)?;
            save_stats(&stats, &stats_out)?;
        }
    }

    info!("done");

    Ok(())
}

fn train_model(config: &RunConfig, path: &Path) -> Result<BayesModel> {
    let table = dataset::read_table(path)?;
    info!(rows = table.rows.len(), "read training data");

    let attributes = config.attributes(&table.columns)?;
    let model = BayesModel::build(
        &table.rows,
        config.label()?,
        &attributes,
        &config.missing_values,
    )
    .with_context(|| format!("failed to build model from {}", path.display()))?;
    info!(
        classes = model.classes().len(),
        attributes = attributes.len(),
        "model built"
    );

    Ok(model)
}

fn predict_file(config: &RunConfig, model: &BayesModel, path: &Path) -> Result<Vec<Prediction>> {
    let table = dataset::read_table(path)?;
    info!(rows = table.rows.len(), "test cases found");

    let predictions = predict(model, &table.rows, config.id()?, &config.missing_values)
        .with_context(|| format!("failed to classify {}", path.display()))?;
    Ok(predictions)
}

fn evaluate_file(config: &RunConfig, predictions: &[Prediction], keys: &Path) -> Result<Stats> {
    let truth = dataset::read_ground_truth(keys, config.id()?, config.label()?)?;
    let stats = evaluate(predictions, &truth)
        .with_context(|| format!("failed to evaluate against {}", keys.display()))?;

    info!(
        total = stats.total_tested,
        correct = stats.correct,
        accuracy = stats.accuracy,
        "evaluation finished"
    );
    println!("Total tested: {}", stats.total_tested);
    println!("Correct: {}", stats.correct);
    println!("Accuracy: {}", stats.accuracy);

    Ok(stats)
}

fn save_model(model: &BayesModel, path: &Path) -> Result<()> {
    dataset::write_model(path, model)?;
    info!(path = %path.display(), "model saved");
    Ok(())
}

fn save_predictions(config: &RunConfig, predictions: &[Prediction], path: &Path) -> Result<()> {
    dataset::write_predictions(path, config.id()?, predictions)?;
    info!(path = %path.display(), count = predictions.len(), "predictions saved");
    Ok(())
}

fn save_stats(stats: &Stats, path: &Path) -> Result<()> {
    dataset::write_stats(path, stats)?;
    info!(path = %path.display(), "stats saved");
    Ok(())
}
