//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{NutriclassArgs, OutputFormat};
use crate::error::Result;
use crate::ml::IntentPrediction;

/// Result structure for a training run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingResult {
    pub model_dir: String,
    pub examples: usize,
    pub epochs: usize,
    pub accuracy: f64,
    pub loss: f64,
    pub vocabulary_size: usize,
    pub intent_count: usize,
    pub duration_ms: u64,
}

/// One ranked prediction, without its feature vector.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionRow {
    pub intent_id: String,
    pub intent_name: String,
    pub confidence: f64,
}

impl From<&IntentPrediction> for PredictionRow {
    fn from(prediction: &IntentPrediction) -> Self {
        PredictionRow {
            intent_id: prediction.intent_id.clone(),
            intent_name: prediction.intent_name.clone(),
            confidence: prediction.confidence,
        }
    }
}

/// Result structure for a prediction.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResult {
    pub text: String,
    pub fallback_used: bool,
    pub best: Option<PredictionRow>,
    pub top: Vec<PredictionRow>,
}

/// Result structure for an evaluation pass.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub examples: usize,
    pub accuracy: f64,
    pub loss: f64,
}

/// Description of a saved model.
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectResult {
    pub summary: String,
    pub intents: Vec<String>,
    pub vocabulary_size: usize,
    pub vocabulary_fingerprint: String,
    pub parameter_count: usize,
    pub trained_at: Option<String>,
}

/// Pipeline artifacts of one utterance.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub original: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    pub stems: Vec<String>,
    pub entities: Vec<String>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &NutriclassArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_human<T: Serialize>(message: &str, result: &T, args: &NutriclassArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    for line in render_human(&value, 0) {
        println!("{line}");
    }
    Ok(())
}

fn output_json<T: Serialize>(result: &T, args: &NutriclassArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Render a JSON value as indented `key: value` lines.
fn render_human(value: &serde_json::Value, indent: usize) -> Vec<String> {
    let pad = "  ".repeat(indent);
    let mut lines = Vec::new();

    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                match val {
                    serde_json::Value::Object(_) => {
                        lines.push(format!("{pad}{key}:"));
                        lines.extend(render_human(val, indent + 1));
                    }
                    serde_json::Value::Array(arr) if arr.iter().any(|v| v.is_object()) => {
                        lines.push(format!("{pad}{key}:"));
                        for (i, item) in arr.iter().enumerate() {
                            lines.push(format!("{pad}  {}.", i + 1));
                            lines.extend(render_human(item, indent + 2));
                        }
                    }
                    _ => lines.push(format!("{pad}{key}: {}", format_value(val))),
                }
            }
        }
        _ => lines.push(format!("{pad}{}", format_value(value))),
    }

    lines
}

/// Format a scalar or array JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "-".to_string(),
    }
}
