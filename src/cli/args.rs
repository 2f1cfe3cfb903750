//! Command line argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// nutriclass - intent classification for nutrition support chat
#[derive(Parser, Debug, Clone)]
#[command(name = "nutriclass")]
#[command(about = "Train and query a linear intent classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct NutriclassArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Engine configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE", env = "NUTRICLASS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl NutriclassArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from a labeled data file and save it
    Train(TrainArgs),

    /// Predict the intent of an utterance
    Predict(PredictArgs),

    /// Evaluate a saved model against a data file
    Evaluate(EvaluateArgs),

    /// Describe a saved model
    Inspect(InspectArgs),

    /// Show how an utterance is normalized, tokenized and stemmed
    Analyze(AnalyzeArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Training data file: JSON array of {"intent", "text"} objects
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,

    /// Directory the model is written to
    #[arg(short, long, value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Number of epochs (defaults to the configured value)
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Minimum number of examples required (defaults to the configured value)
    #[arg(long)]
    pub min_examples: Option<usize>,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Directory holding the saved model
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Data file used to resolve intent ids
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,

    /// Utterance to classify
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Number of ranked predictions (defaults to the configured value)
    #[arg(short, long)]
    pub top: Option<usize>,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Directory holding the saved model
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Labeled data file to evaluate against
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,
}

/// Arguments for model inspection
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Directory holding the saved model
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Data file used to resolve intent ids
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,
}

/// Arguments for text analysis
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Text to analyze
    #[arg(value_name = "TEXT")]
    pub text: String,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity() {
        let args = NutriclassArgs::try_parse_from(["nutriclass", "analyze", "hi"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = NutriclassArgs::try_parse_from(["nutriclass", "-vv", "analyze", "hi"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args =
            NutriclassArgs::try_parse_from(["nutriclass", "--quiet", "analyze", "hi"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            NutriclassArgs::try_parse_from(["nutriclass", "--format", "json", "analyze", "hi"])
                .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_train_args() {
        let args = NutriclassArgs::try_parse_from([
            "nutriclass",
            "train",
            "data.json",
            "--model-dir",
            "models",
            "--epochs",
            "25",
        ])
        .unwrap();

        if let Command::Train(train) = args.command {
            assert_eq!(train.data_file, PathBuf::from("data.json"));
            assert_eq!(train.model_dir, PathBuf::from("models"));
            assert_eq!(train.epochs, Some(25));
            assert_eq!(train.min_examples, None);
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_predict_args() {
        let args = NutriclassArgs::try_parse_from([
            "nutriclass",
            "predict",
            "models",
            "data.json",
            "how much protein",
            "--top",
            "2",
        ])
        .unwrap();

        if let Command::Predict(predict) = args.command {
            assert_eq!(predict.text, "how much protein");
            assert_eq!(predict.top, Some(2));
        } else {
            panic!("Expected Predict command");
        }
    }

    #[test]
    fn test_train_requires_model_dir() {
        assert!(NutriclassArgs::try_parse_from(["nutriclass", "train", "data.json"]).is_err());
    }
}
