//! Result types of the classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::FeatureVector;

/// A resolved intent prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPrediction {
    pub intent_id: String,
    pub intent_name: String,
    /// Softmax probability of this intent.
    pub confidence: f64,
    /// Feature vector the prediction was made from.
    pub features: FeatureVector,
}

/// Loss and accuracy of one pass over the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number, 0 for an evaluation pass.
    pub epoch: usize,
    /// Mean cross-entropy loss.
    pub loss: f64,
    pub accuracy: f64,
    pub correct: usize,
    pub samples: usize,
}

impl EpochStats {
    pub fn new(epoch: usize, total_loss: f64, correct: usize, samples: usize) -> Self {
        let (loss, accuracy) = if samples == 0 {
            (0.0, 0.0)
        } else {
            (total_loss / samples as f64, correct as f64 / samples as f64)
        };
        EpochStats {
            epoch,
            loss,
            accuracy,
            correct,
            samples,
        }
    }
}

/// Summary of a training run or an evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    pub loss: f64,
    pub epochs: usize,
    pub dataset_size: usize,
    pub vocabulary_size: usize,
    pub intent_count: usize,
    /// Per-epoch statistics, empty for an evaluation pass.
    pub epoch_history: Vec<EpochStats>,
    pub completed_at: DateTime<Utc>,
}
