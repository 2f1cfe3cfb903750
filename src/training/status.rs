//! Training status record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage of the current or last training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStage {
    #[default]
    Idle,
    Preparing,
    Training,
    Evaluating,
    Saving,
    Completed,
    Error,
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainingStage::Idle => "idle",
            TrainingStage::Preparing => "preparing",
            TrainingStage::Training => "training",
            TrainingStage::Evaluating => "evaluating",
            TrainingStage::Saving => "saving",
            TrainingStage::Completed => "completed",
            TrainingStage::Error => "error",
        };
        f.write_str(name)
    }
}

/// Snapshot of training progress. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub is_training: bool,
    /// 0 to 100.
    pub progress: u8,
    pub stage: TrainingStage,
    pub error: Option<String>,
    pub accuracy: Option<f64>,
    pub loss: Option<f64>,
    pub last_training: Option<DateTime<Utc>>,
}

impl TrainingStatus {
    /// Claim the status for a new run. Returns false if a run is active.
    pub(crate) fn try_begin(&mut self) -> bool {
        if self.is_training {
            return false;
        }
        self.is_training = true;
        self.progress = 0;
        self.stage = TrainingStage::Preparing;
        self.error = None;
        true
    }

    pub(crate) fn advance(&mut self, stage: TrainingStage, progress: u8) {
        self.stage = stage;
        self.progress = progress.min(100);
    }

    pub(crate) fn complete(&mut self, accuracy: f64, loss: f64, at: DateTime<Utc>) {
        self.is_training = false;
        self.progress = 100;
        self.stage = TrainingStage::Completed;
        self.error = None;
        self.accuracy = Some(accuracy);
        self.loss = Some(loss);
        self.last_training = Some(at);
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.is_training = false;
        self.stage = TrainingStage::Error;
        self.error = Some(message);
    }
}
