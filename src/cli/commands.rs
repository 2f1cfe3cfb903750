//! Command implementations for the nutriclass CLI.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EngineConfig;
use crate::error::{NutriclassError, Result};
use crate::repository::{MemoryEventLog, MemoryTrainingData, StorageModelStore};
use crate::text::TextProcessor;
use crate::training::TrainingManager;

/// Execute a CLI command.
pub fn execute_command(args: NutriclassArgs) -> Result<()> {
    let config = load_config(&args)?;

    match &args.command {
        Command::Train(train_args) => train(train_args, config, &args),
        Command::Predict(predict_args) => predict(predict_args, config, &args),
        Command::Evaluate(evaluate_args) => evaluate(evaluate_args, config, &args),
        Command::Inspect(inspect_args) => inspect(inspect_args, config, &args),
        Command::Analyze(analyze_args) => analyze(analyze_args, config, &args),
    }
}

fn load_config(args: &NutriclassArgs) -> Result<EngineConfig> {
    match &args.config {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            EngineConfig::from_file(path)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Build a manager over a data file and a model directory.
fn open_manager(
    config: &EngineConfig,
    data_file: &Path,
    model_dir: &Path,
) -> Result<(TrainingManager, usize)> {
    let data = Arc::new(MemoryTrainingData::from_json_file(data_file)?);
    let examples = data.active_example_count();
    let store = Arc::new(StorageModelStore::open_dir(model_dir)?);
    let manager = TrainingManager::new(config, data, store, Arc::new(MemoryEventLog::default()))?;
    Ok((manager, examples))
}

/// Build a manager and restore the saved model.
fn open_trained_manager(
    config: &EngineConfig,
    data_file: &Path,
    model_dir: &Path,
) -> Result<TrainingManager> {
    let (manager, _) = open_manager(config, data_file, model_dir)?;
    if !manager.initialize() {
        return Err(NutriclassError::ModelNotFound);
    }
    Ok(manager)
}

fn train(args: &TrainArgs, mut config: EngineConfig, cli_args: &NutriclassArgs) -> Result<()> {
    if let Some(min_examples) = args.min_examples {
        config.training.min_training_examples = min_examples;
    }
    let epochs = args.epochs.unwrap_or(config.training.epochs);

    if cli_args.verbosity() > 1 {
        println!("Training from: {}", args.data_file.display());
    }

    let start_time = Instant::now();
    let (manager, examples) = open_manager(&config, &args.data_file, &args.model_dir)?;
    let report = manager.train_model(epochs, true)?;

    output_result(
        "Model trained successfully",
        &TrainingResult {
            model_dir: args.model_dir.to_string_lossy().to_string(),
            examples,
            epochs,
            accuracy: report.evaluation.accuracy,
            loss: report.evaluation.loss,
            vocabulary_size: report.training.vocabulary_size,
            intent_count: report.training.intent_count,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

fn predict(args: &PredictArgs, mut config: EngineConfig, cli_args: &NutriclassArgs) -> Result<()> {
    if let Some(top) = args.top {
        config.training.top_k = top;
    }

    let manager = open_trained_manager(&config, &args.data_file, &args.model_dir)?;
    let prediction = manager.get_enhanced_prediction(&args.text, true);

    output_result(
        "Prediction",
        &PredictionResult {
            text: args.text.clone(),
            fallback_used: prediction.fallback_used,
            best: prediction.neural_prediction.as_ref().map(PredictionRow::from),
            top: prediction
                .top_predictions
                .iter()
                .map(PredictionRow::from)
                .collect(),
        },
        cli_args,
    )
}

fn evaluate(args: &EvaluateArgs, config: EngineConfig, cli_args: &NutriclassArgs) -> Result<()> {
    let manager = open_trained_manager(&config, &args.data_file, &args.model_dir)?;
    let metrics = manager.classifier().evaluate_model()?;

    output_result(
        "Evaluation",
        &EvaluationResult {
            examples: metrics.dataset_size,
            accuracy: metrics.accuracy,
            loss: metrics.loss,
        },
        cli_args,
    )
}

fn inspect(args: &InspectArgs, config: EngineConfig, cli_args: &NutriclassArgs) -> Result<()> {
    let manager = open_trained_manager(&config, &args.data_file, &args.model_dir)?;
    let classifier = manager.classifier();

    output_result(
        "Model",
        &InspectResult {
            summary: classifier.model_summary(),
            intents: classifier.intent_ids().to_vec(),
            vocabulary_size: classifier.vocabulary_size(),
            vocabulary_fingerprint: format!("{:08x}", classifier.vocabulary_fingerprint()),
            parameter_count: classifier.parameter_count(),
            trained_at: classifier.trained_at().map(|t| t.to_rfc3339()),
        },
        cli_args,
    )
}

fn analyze(args: &AnalyzeArgs, config: EngineConfig, cli_args: &NutriclassArgs) -> Result<()> {
    let processor = TextProcessor::new(config.text)?;
    let processed = processor.process_text(&args.text)?;

    output_result(
        "Analysis",
        &AnalysisResult {
            original: processed.original,
            normalized: processed.normalized,
            tokens: processed.tokens,
            stems: processed.stems,
            entities: processed.entities,
        },
        cli_args,
    )
}
