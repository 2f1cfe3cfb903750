//! Training orchestration around the live classifier.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, TrainingConfig};
use crate::error::{NutriclassError, Result};
use crate::ml::{IntentClassifier, IntentPrediction, TrainingMetrics};
use crate::repository::{
    AnalyticsEvent, EventKind, EventPayload, EventSink, ModelStore, NewExample,
    TrainingDataSource, TrainingExample,
};
use crate::training::metrics::{ModelMetrics, PredictionStats};
use crate::training::status::{TrainingStage, TrainingStatus};

const PROGRESS_TRAINING_START: u8 = 10;
const PROGRESS_TRAINING_END: u8 = 70;
const PROGRESS_EVALUATING: u8 = 75;
const PROGRESS_SAVING: u8 = 90;

/// Result of a completed training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Final-epoch metrics of the training pass.
    pub training: TrainingMetrics,
    /// Metrics of the evaluation pass that followed.
    pub evaluation: TrainingMetrics,
    pub saved: bool,
}

/// Answer to a caller asking for an intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedPrediction {
    pub neural_prediction: Option<IntentPrediction>,
    pub top_predictions: Vec<IntentPrediction>,
    /// True when the caller should use its non-neural path.
    pub fallback_used: bool,
}

impl EnhancedPrediction {
    fn fallback() -> Self {
        EnhancedPrediction {
            neural_prediction: None,
            top_predictions: Vec::new(),
            fallback_used: true,
        }
    }
}

/// Owns the live classifier and coordinates training, persistence,
/// inference and analytics.
///
/// Only one training run may be active at a time. A run trains a fresh
/// classifier and swaps it in when done, so predictions keep being served
/// from the previous model while training is in flight.
#[derive(Debug)]
pub struct TrainingManager {
    classifier: RwLock<IntentClassifier>,
    status: Mutex<TrainingStatus>,
    data_source: Arc<dyn TrainingDataSource>,
    event_sink: Arc<dyn EventSink>,
    config: TrainingConfig,
}

impl TrainingManager {
    pub fn new(
        config: &EngineConfig,
        data_source: Arc<dyn TrainingDataSource>,
        model_store: Arc<dyn ModelStore>,
        event_sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        let classifier = IntentClassifier::new(config, Arc::clone(&data_source), model_store)?;

        Ok(TrainingManager {
            classifier: RwLock::new(classifier),
            status: Mutex::new(TrainingStatus::default()),
            data_source,
            event_sink,
            config: config.training.clone(),
        })
    }

    /// Load the last saved model, if any. Never trains.
    pub fn initialize(&self) -> bool {
        let loaded = self.classifier.write().load_model();
        if loaded {
            info!("intent model restored from store");
        }
        loaded
    }

    /// Run a full training pass.
    ///
    /// Rejects the call with [`NutriclassError::TrainingInProgress`] if
    /// another run is active. Any other failure is also recorded in the
    /// status with stage `error`.
    pub fn train_model(&self, epochs: usize, auto_save: bool) -> Result<TrainingReport> {
        if !self.status.lock().try_begin() {
            return Err(NutriclassError::TrainingInProgress);
        }

        let result = self.run_training(epochs, auto_save);
        let mut status = self.status.lock();
        match &result {
            Ok(report) => status.complete(
                report.evaluation.accuracy,
                report.evaluation.loss,
                report.evaluation.completed_at,
            ),
            Err(e) => {
                warn!("training failed: {e}");
                status.fail(e.to_string());
            }
        }
        result
    }

    fn run_training(&self, epochs: usize, auto_save: bool) -> Result<TrainingReport> {
        // Examples created after this instant count toward the next run.
        let snapshot_at = Utc::now();
        let available: usize = self
            .data_source
            .active_intents()?
            .iter()
            .map(|intent| intent.examples.len())
            .sum();
        if available < self.config.min_training_examples {
            return Err(NutriclassError::InsufficientData {
                required: self.config.min_training_examples,
                actual: available,
            });
        }

        self.set_stage(TrainingStage::Training, PROGRESS_TRAINING_START);
        let mut candidate = self.classifier.read().fresh()?;
        let span = u64::from(PROGRESS_TRAINING_END - PROGRESS_TRAINING_START);
        let training = candidate.train_model_with_progress(epochs, |stats| {
            let done = span * stats.epoch as u64 / epochs.max(1) as u64;
            let progress = PROGRESS_TRAINING_START + u8::try_from(done).unwrap_or(0);
            self.status.lock().progress = progress;
        })?;

        self.set_stage(TrainingStage::Evaluating, PROGRESS_EVALUATING);
        let evaluation = candidate.evaluate_model()?;

        if auto_save {
            self.set_stage(TrainingStage::Saving, PROGRESS_SAVING);
            candidate.save_model()?;
        }

        *self.classifier.write() = candidate;
        info!(
            "training completed: accuracy={:.4} loss={:.4} examples={}",
            evaluation.accuracy, evaluation.loss, training.dataset_size
        );

        self.record(AnalyticsEvent::at(
            EventPayload::TrainingCompleted {
                accuracy: evaluation.accuracy,
                loss: evaluation.loss,
                epochs,
                dataset_size: training.dataset_size,
            },
            snapshot_at,
        ));

        Ok(TrainingReport {
            training,
            evaluation,
            saved: auto_save,
        })
    }

    /// Run [`train_model`](Self::train_model) on tokio's blocking pool.
    pub fn spawn_training(
        self: Arc<Self>,
        epochs: usize,
        auto_save: bool,
    ) -> tokio::task::JoinHandle<Result<TrainingReport>> {
        tokio::task::spawn_blocking(move || self.train_model(epochs, auto_save))
    }

    /// A shorter, saving training pass.
    pub fn retrain_model(&self) -> Result<TrainingReport> {
        self.train_model(self.config.retrain_epochs, true)
    }

    /// Best and top-k predictions, or a fallback marker when the model is
    /// unavailable. Inference errors degrade to the fallback.
    pub fn get_enhanced_prediction(
        &self,
        text: &str,
        use_neural_network: bool,
    ) -> EnhancedPrediction {
        if !use_neural_network {
            return EnhancedPrediction::fallback();
        }

        let outcome = {
            let classifier = self.classifier.read();
            if !classifier.is_ready() {
                return EnhancedPrediction::fallback();
            }
            classifier.predict_intent(text).and_then(|best| {
                let top = classifier.predict_top_intents(text, self.config.top_k)?;
                Ok((best, top))
            })
        };

        match outcome {
            Ok((Some(best), top)) => {
                self.record_event(EventPayload::Prediction {
                    text: text.chars().take(self.config.prediction_log_chars).collect(),
                    intent_id: best.intent_id.clone(),
                    intent_name: best.intent_name.clone(),
                    confidence: best.confidence,
                });
                EnhancedPrediction {
                    neural_prediction: Some(best),
                    top_predictions: top,
                    fallback_used: false,
                }
            }
            Ok((None, _)) => EnhancedPrediction::fallback(),
            Err(e) => {
                warn!("prediction failed, using fallback: {e}");
                EnhancedPrediction::fallback()
            }
        }
    }

    /// Store one labeled example with its stems as keywords, then
    /// optionally retrain. A failed retrain is logged and left in the status.
    pub fn add_training_data(
        &self,
        intent_id: &str,
        text: &str,
        auto_retrain: bool,
    ) -> Result<TrainingExample> {
        let keywords = self.classifier.read().processor().stems(text)?;
        let example = self.data_source.append_example(NewExample {
            intent_id: intent_id.to_string(),
            text: text.to_string(),
            keywords,
            confidence: None,
        })?;

        if auto_retrain && let Err(e) = self.retrain_model() {
            warn!("retraining after new example failed: {e}");
        }

        Ok(example)
    }

    /// True if no training has completed yet, or more than
    /// `retrain_threshold` examples were added since the last one.
    pub fn should_retrain(&self) -> Result<bool> {
        let last = self
            .event_sink
            .events(Some(EventKind::TrainingCompleted))?
            .into_iter()
            .map(|event| event.timestamp)
            .max();

        match last {
            None => Ok(true),
            Some(since) => {
                Ok(self.data_source.count_examples_since(since)? > self.config.retrain_threshold)
            }
        }
    }

    pub fn get_metrics(&self) -> Result<ModelMetrics> {
        let status = self.status();
        let events = self.event_sink.events(None)?;
        let training_runs = events
            .iter()
            .filter(|event| event.kind() == EventKind::TrainingCompleted)
            .count();
        let total_predictions = events.len() - training_runs;

        let classifier = self.classifier.read();
        Ok(ModelMetrics {
            ready: classifier.is_ready(),
            accuracy: status.accuracy,
            loss: status.loss,
            last_training: status.last_training.or(classifier.trained_at()),
            training_runs,
            vocabulary_size: classifier.vocabulary_size(),
            intent_count: classifier.intent_count(),
            parameter_count: classifier.parameter_count(),
            total_predictions,
        })
    }

    pub fn get_prediction_stats(&self) -> Result<PredictionStats> {
        let events = self.event_sink.events(Some(EventKind::Prediction))?;
        Ok(PredictionStats::from_events(
            &events,
            self.config.low_confidence_threshold,
        ))
    }

    pub fn status(&self) -> TrainingStatus {
        self.status.lock().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.classifier.read().is_ready()
    }

    /// Read access to the live classifier.
    pub fn classifier(&self) -> RwLockReadGuard<'_, IntentClassifier> {
        self.classifier.read()
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    fn set_stage(&self, stage: TrainingStage, progress: u8) {
        self.status.lock().advance(stage, progress);
    }

    fn record_event(&self, payload: EventPayload) {
        self.record(AnalyticsEvent::new(payload));
    }

    fn record(&self, event: AnalyticsEvent) {
        if let Err(e) = self.event_sink.record(event) {
            warn!("failed to record analytics event: {e}");
        }
    }
}
