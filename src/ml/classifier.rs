//! The intent classifier: text processor, linear network and intent mapping.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::config::{EngineConfig, NetworkConfig};
use crate::error::{NutriclassError, Result};
use crate::ml::model::{ModelRecord, ModelState};
use crate::ml::network::{LinearNetwork, argmax};
use crate::ml::types::{EpochStats, IntentPrediction, TrainingMetrics};
use crate::repository::{IntentInfo, ModelStore, TrainingDataSource};
use crate::text::{FeatureVector, TextProcessor};

/// Labeled dataset in network form.
struct Dataset {
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

/// Classifies utterances into intents.
///
/// The classifier is either untrained or trained. Training rebuilds the
/// vocabulary and the weights from the full active example set; loading a
/// saved model goes straight to trained.
#[derive(Debug)]
pub struct IntentClassifier {
    processor: TextProcessor,
    network: LinearNetwork,
    network_config: NetworkConfig,
    data_source: Arc<dyn TrainingDataSource>,
    model_store: Arc<dyn ModelStore>,
    index_to_intent: Vec<String>,
    intent_to_index: HashMap<String, usize>,
    intent_names: Vec<String>,
    /// Fingerprint of the vocabulary the weights were trained against.
    vocabulary_fingerprint: u32,
    trained: bool,
    trained_at: Option<DateTime<Utc>>,
}

impl IntentClassifier {
    pub fn new(
        config: &EngineConfig,
        data_source: Arc<dyn TrainingDataSource>,
        model_store: Arc<dyn ModelStore>,
    ) -> Result<Self> {
        let processor = TextProcessor::new(config.text.clone())?;
        let vocabulary_fingerprint = processor.vocabulary().fingerprint();

        Ok(IntentClassifier {
            processor,
            network: LinearNetwork::new(&config.network),
            network_config: config.network.clone(),
            data_source,
            model_store,
            index_to_intent: Vec::new(),
            intent_to_index: HashMap::new(),
            intent_names: Vec::new(),
            vocabulary_fingerprint,
            trained: false,
            trained_at: None,
        })
    }

    /// An untrained classifier with the same configuration and collaborators.
    pub fn fresh(&self) -> Result<Self> {
        let config = EngineConfig {
            text: self.processor.config().clone(),
            network: self.network_config.clone(),
            ..EngineConfig::default()
        };
        Self::new(
            &config,
            Arc::clone(&self.data_source),
            Arc::clone(&self.model_store),
        )
    }

    /// Train from every active example.
    pub fn train_model(&mut self, epochs: usize) -> Result<TrainingMetrics> {
        self.train_model_with_progress(epochs, |_| {})
    }

    /// Train from every active example, reporting after each epoch.
    ///
    /// Examples are visited in data-source order and the weights are updated
    /// after every example. The reported accuracy and loss are those of the
    /// final epoch.
    pub fn train_model_with_progress<F>(
        &mut self,
        epochs: usize,
        mut on_epoch: F,
    ) -> Result<TrainingMetrics>
    where
        F: FnMut(&EpochStats),
    {
        if epochs == 0 {
            return Err(NutriclassError::invalid_argument("epochs must be > 0"));
        }

        let intents = self.data_source.active_intents()?;
        let mut texts: Vec<&str> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();
        let mut index_to_intent = Vec::new();
        let mut intent_names = Vec::new();
        for intent in intents.iter().filter(|intent| !intent.examples.is_empty()) {
            let idx = index_to_intent.len();
            index_to_intent.push(intent.info.id.clone());
            intent_names.push(intent.info.name.clone());
            for example in &intent.examples {
                texts.push(&example.text);
                labels.push(idx);
            }
        }

        if texts.is_empty() {
            return Err(NutriclassError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        // Any failure from here on leaves the classifier untrained.
        self.trained = false;
        self.network = LinearNetwork::new(&self.network_config);

        self.processor.build_vocabulary(&texts)?;
        let processor = &self.processor;
        let features: Vec<Vec<f64>> = texts
            .par_iter()
            .map(|text| processor.vectorize(text).map(FeatureVector::into_values))
            .collect::<Result<_>>()?;
        let dataset = Dataset { features, labels };

        let vocabulary_size = self.processor.vocabulary_size();
        let intent_count = index_to_intent.len();
        info!(
            "training on {} examples, {} intents, {} stems, {} epochs",
            dataset.labels.len(),
            intent_count,
            vocabulary_size,
            epochs
        );

        let mut rng = match self.network_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut network = LinearNetwork::new(&self.network_config);
        network.initialize_weights(vocabulary_size, intent_count, &mut rng);

        let mut epoch_history = Vec::with_capacity(epochs);
        for epoch in 1..=epochs {
            let stats = network.train_epoch(epoch, &dataset.features, &dataset.labels)?;
            debug!(
                "epoch {}/{}: loss={:.4} accuracy={:.4}",
                epoch, epochs, stats.loss, stats.accuracy
            );
            on_epoch(&stats);
            epoch_history.push(stats);
        }

        let last = epoch_history
            .last()
            .copied()
            .unwrap_or_else(|| EpochStats::new(epochs, 0.0, 0, 0));

        self.intent_to_index = index_to_intent
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        self.index_to_intent = index_to_intent;
        self.intent_names = intent_names;
        self.vocabulary_fingerprint = self.processor.vocabulary().fingerprint();
        self.network = network;
        self.trained = true;
        let completed_at = Utc::now();
        self.trained_at = Some(completed_at);

        Ok(TrainingMetrics {
            accuracy: last.accuracy,
            loss: last.loss,
            epochs,
            dataset_size: dataset.labels.len(),
            vocabulary_size,
            intent_count,
            epoch_history,
            completed_at,
        })
    }

    /// Best intent for a text, or `None` when the model is not ready or the
    /// winning intent no longer resolves to an active intent.
    pub fn predict_intent(&self, text: &str) -> Result<Option<IntentPrediction>> {
        if !self.is_ready() {
            return Ok(None);
        }

        let features = self.processor.vectorize(text)?;
        let probabilities = self.probabilities(&features)?;
        let Some((idx, confidence)) = argmax(&probabilities) else {
            return Ok(None);
        };

        Ok(self.resolve(idx)?.map(|info| IntentPrediction {
            intent_id: info.id,
            intent_name: info.name,
            confidence,
            features,
        }))
    }

    /// Up to `k` predictions by descending confidence. Intents that no
    /// longer resolve are skipped.
    pub fn predict_top_intents(&self, text: &str, k: usize) -> Result<Vec<IntentPrediction>> {
        if !self.is_ready() || k == 0 {
            return Ok(Vec::new());
        }

        let features = self.processor.vectorize(text)?;
        let probabilities = self.probabilities(&features)?;

        let mut ranked: Vec<(usize, f64)> = probabilities.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut predictions = Vec::with_capacity(k.min(ranked.len()));
        for (idx, confidence) in ranked {
            if predictions.len() == k {
                break;
            }
            if let Some(info) = self.resolve(idx)? {
                predictions.push(IntentPrediction {
                    intent_id: info.id,
                    intent_name: info.name,
                    confidence,
                    features: features.clone(),
                });
            }
        }

        Ok(predictions)
    }

    /// Output distribution for a feature vector.
    ///
    /// Fails with [`NutriclassError::VocabularyMismatch`] if the vector was
    /// built against a different vocabulary than the model.
    pub fn probabilities(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        if !self.is_ready() {
            return Err(NutriclassError::NotReady);
        }
        if features.fingerprint() != self.vocabulary_fingerprint {
            return Err(NutriclassError::VocabularyMismatch {
                expected: self.vocabulary_fingerprint,
                actual: features.fingerprint(),
            });
        }
        self.network.forward(features.values())
    }

    /// Loss and accuracy of the current weights over the current active
    /// examples. Examples of intents unknown to the model are skipped.
    pub fn evaluate_model(&self) -> Result<TrainingMetrics> {
        if !self.is_ready() {
            return Err(NutriclassError::NotReady);
        }

        let intents = self.data_source.active_intents()?;
        let mut texts: Vec<&str> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();
        for intent in &intents {
            let Some(&idx) = self.intent_to_index.get(&intent.info.id) else {
                continue;
            };
            for example in &intent.examples {
                texts.push(&example.text);
                labels.push(idx);
            }
        }

        if texts.is_empty() {
            return Err(NutriclassError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let features: Vec<Vec<f64>> = texts
            .par_iter()
            .map(|text| self.processor.vectorize(text).map(FeatureVector::into_values))
            .collect::<Result<_>>()?;
        let stats = self.network.evaluate(&features, &labels)?;

        Ok(TrainingMetrics {
            accuracy: stats.accuracy,
            loss: stats.loss,
            epochs: 0,
            dataset_size: stats.samples,
            vocabulary_size: self.vocabulary_size(),
            intent_count: self.intent_count(),
            epoch_history: Vec::new(),
            completed_at: Utc::now(),
        })
    }

    /// Persist the model state through the model store.
    pub fn save_model(&self) -> Result<()> {
        if !self.is_ready() {
            return Err(NutriclassError::NotReady);
        }

        let bytes = ModelRecord::new(self.model_state()).encode()?;
        self.model_store.write(&bytes)?;
        info!(
            "saved model ({} bytes, {} intents, {} stems)",
            bytes.len(),
            self.intent_count(),
            self.vocabulary_size()
        );
        Ok(())
    }

    /// Restore the most recently saved model.
    ///
    /// Returns false, leaving the classifier unchanged, when nothing was saved
    /// yet or the record cannot be used.
    pub fn load_model(&mut self) -> bool {
        match self.try_load_model() {
            Ok(()) => {
                info!(
                    "loaded model with {} intents and {} stems",
                    self.intent_count(),
                    self.vocabulary_size()
                );
                true
            }
            Err(NutriclassError::ModelNotFound) => {
                info!("no saved model found");
                false
            }
            Err(e) => {
                warn!("failed to load model: {e}");
                false
            }
        }
    }

    /// Like [`load_model`](Self::load_model) but reports why loading failed.
    pub fn try_load_model(&mut self) -> Result<()> {
        let bytes = self
            .model_store
            .read_latest()?
            .ok_or(NutriclassError::ModelNotFound)?;
        let record = ModelRecord::decode(&bytes)?;
        self.apply_state(record.state)
    }

    /// Snapshot of the persistable state.
    pub fn model_state(&self) -> ModelState {
        ModelState {
            weights: self.network.weights().to_vec(),
            biases: self.network.biases().to_vec(),
            vocabulary: self.processor.export_vocabulary(),
            vocabulary_fingerprint: self.vocabulary_fingerprint,
            index_to_intent: self.index_to_intent.clone(),
            intent_to_index: self.intent_to_index.clone(),
            intent_names: self.intent_names.clone(),
            trained: self.trained,
            trained_at: self.trained_at,
        }
    }

    fn apply_state(&mut self, state: ModelState) -> Result<()> {
        let vocabulary = state.validate()?;
        if !state.trained {
            return Err(NutriclassError::corrupt("record holds an untrained model"));
        }
        let network =
            LinearNetwork::from_parameters(&self.network_config, state.weights, state.biases)?;

        self.processor.set_vocabulary(vocabulary);
        self.network = network;
        self.index_to_intent = state.index_to_intent;
        self.intent_to_index = state.intent_to_index;
        self.intent_names = state.intent_names;
        self.vocabulary_fingerprint = state.vocabulary_fingerprint;
        self.trained = true;
        self.trained_at = state.trained_at;
        Ok(())
    }

    /// True when trained (or loaded) with a non-empty weight matrix.
    pub fn is_ready(&self) -> bool {
        self.trained && !self.network.is_empty()
    }

    pub fn model_summary(&self) -> String {
        format!(
            "Input size: {}, Output size: {}, Parameters: {}, Vocabulary size: {}, Intents: {}",
            self.network.input_size(),
            self.network.output_size(),
            self.network.parameter_count(),
            self.vocabulary_size(),
            self.intent_count()
        )
    }

    /// Resolve an output index to an active intent through the data source.
    fn resolve(&self, idx: usize) -> Result<Option<IntentInfo>> {
        let Some(id) = self.index_to_intent.get(idx) else {
            return Ok(None);
        };
        match self.data_source.intent(id)? {
            Some(info) if info.active => Ok(Some(info)),
            _ => {
                warn!("intent '{id}' at output {idx} no longer resolves");
                Ok(None)
            }
        }
    }

    pub fn processor(&self) -> &TextProcessor {
        &self.processor
    }

    pub fn network(&self) -> &LinearNetwork {
        &self.network
    }

    pub fn intent_count(&self) -> usize {
        self.index_to_intent.len()
    }

    /// Intent ids by output index.
    pub fn intent_ids(&self) -> &[String] {
        &self.index_to_intent
    }

    pub fn vocabulary_size(&self) -> usize {
        self.processor.vocabulary_size()
    }

    pub fn vocabulary_fingerprint(&self) -> u32 {
        self.vocabulary_fingerprint
    }

    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.trained_at
    }

    pub fn parameter_count(&self) -> usize {
        self.network.parameter_count()
    }

    pub fn calculate_similarity(&self, text_a: &str, text_b: &str) -> Result<f64> {
        self.processor.calculate_similarity(text_a, text_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{IntentSample, MemoryTrainingData, StorageModelStore};

    fn config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.text.min_word_freq = 1;
        config.network.seed = Some(7);
        config
    }

    fn samples(pairs: &[(&str, &str)]) -> Vec<IntentSample> {
        pairs
            .iter()
            .map(|(intent, text)| IntentSample {
                intent: intent.to_string(),
                text: text.to_string(),
            })
            .collect()
    }

    fn scenario_data() -> Arc<MemoryTrainingData> {
        Arc::new(
            MemoryTrainingData::from_samples(samples(&[
                ("greeting", "hi"),
                ("greeting", "hello there"),
                ("protein_question", "how much protein do I need"),
                ("protein_question", "best protein sources"),
            ]))
            .unwrap(),
        )
    }

    fn classifier(data: Arc<MemoryTrainingData>) -> IntentClassifier {
        IntentClassifier::new(&config(), data, Arc::new(StorageModelStore::in_memory())).unwrap()
    }

    #[test]
    fn test_untrained_is_not_ready() {
        let classifier = classifier(scenario_data());
        assert!(!classifier.is_ready());
        assert!(classifier.predict_intent("hello").unwrap().is_none());
        assert!(classifier.predict_top_intents("hello", 3).unwrap().is_empty());
        assert!(matches!(
            classifier.evaluate_model(),
            Err(NutriclassError::NotReady)
        ));
        assert!(matches!(
            classifier.save_model(),
            Err(NutriclassError::NotReady)
        ));
    }

    #[test]
    fn test_train_without_examples_fails() {
        let mut classifier = classifier(Arc::new(MemoryTrainingData::new()));
        let err = classifier.train_model(10).unwrap_err();
        assert!(matches!(err, NutriclassError::InsufficientData { actual: 0, .. }));
        assert!(!classifier.is_ready());
    }

    #[test]
    fn test_scenario_predictions() {
        let mut classifier = classifier(scenario_data());
        let metrics = classifier.train_model(500).unwrap();
        assert_eq!(metrics.epoch_history.len(), 500);
        assert_eq!(metrics.dataset_size, 4);
        assert_eq!(metrics.intent_count, 2);

        let hello = classifier.predict_intent("hello").unwrap().unwrap();
        assert_eq!(hello.intent_id, "greeting");
        assert!(hello.confidence > 0.5);

        let protein = classifier
            .predict_intent("what protein should I eat")
            .unwrap()
            .unwrap();
        assert_eq!(protein.intent_id, "protein_question");
        assert!(protein.confidence > 0.5);

        let top = classifier.predict_top_intents("best protein", 3).unwrap();
        assert_eq!(top.len(), 2);
        assert!(top[0].confidence >= top[1].confidence);
        assert!((top.iter().map(|p| p.confidence).sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_loss_decreases() {
        let mut classifier = classifier(scenario_data());
        let metrics = classifier.train_model(200).unwrap();
        let first = metrics.epoch_history[0].loss;
        assert!(metrics.loss < first);
    }

    #[test]
    fn test_progress_callback_sees_every_epoch() {
        let mut classifier = classifier(scenario_data());
        let mut seen = Vec::new();
        classifier
            .train_model_with_progress(5, |stats| seen.push(stats.epoch))
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_foreign_vector_is_rejected() {
        let mut classifier = classifier(scenario_data());
        classifier.train_model(5).unwrap();

        let foreign = FeatureVector::new(vec![0.0; classifier.vocabulary_size()], 0xdead_beef);
        assert!(matches!(
            classifier.probabilities(&foreign),
            Err(NutriclassError::VocabularyMismatch { .. })
        ));
    }

    #[test]
    fn test_deactivated_intent_is_skipped() {
        let data = scenario_data();
        let mut classifier = classifier(Arc::clone(&data));
        classifier.train_model(300).unwrap();

        data.set_intent_active("greeting", false);
        assert!(classifier.predict_intent("hello").unwrap().is_none());

        let top = classifier.predict_top_intents("hello", 3).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].intent_id, "protein_question");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let data = scenario_data();
        let store: Arc<dyn ModelStore> = Arc::new(StorageModelStore::in_memory());
        let mut trained = IntentClassifier::new(&config(), data.clone(), store.clone()).unwrap();
        trained.train_model(100).unwrap();
        trained.save_model().unwrap();

        let mut loaded = IntentClassifier::new(&config(), data, store).unwrap();
        assert!(loaded.load_model());
        assert!(loaded.is_ready());
        assert_eq!(loaded.model_state(), trained.model_state());

        for probe in ["hello", "protein sources", "need help", ""] {
            let a = trained.predict_intent(probe).unwrap().unwrap();
            let b = loaded.predict_intent(probe).unwrap().unwrap();
            assert_eq!(a.intent_id, b.intent_id);
            assert!((a.confidence - b.confidence).abs() < 1e-12);
        }
    }

    #[test]
    fn test_load_without_record_returns_false() {
        let mut classifier = classifier(scenario_data());
        assert!(!classifier.load_model());
        assert!(matches!(
            classifier.try_load_model(),
            Err(NutriclassError::ModelNotFound)
        ));
    }

    #[test]
    fn test_load_corrupt_record_returns_false() {
        let store = Arc::new(StorageModelStore::in_memory());
        store.write(b"definitely not a model").unwrap();
        let mut classifier =
            IntentClassifier::new(&config(), scenario_data(), store).unwrap();
        assert!(!classifier.load_model());
        assert!(!classifier.is_ready());
    }

    #[test]
    fn test_model_summary() {
        let mut classifier = classifier(scenario_data());
        classifier.train_model(1).unwrap();
        let vocab = classifier.vocabulary_size();
        let summary = classifier.model_summary();
        assert!(summary.contains(&format!("Input size: {vocab}")));
        assert!(summary.contains("Output size: 2"));
        assert!(summary.contains(&format!("Parameters: {}", vocab * 2 + 2)));
    }

    #[test]
    fn test_evaluate_matches_training_fit() {
        let mut classifier = classifier(scenario_data());
        classifier.train_model(500).unwrap();
        let evaluation = classifier.evaluate_model().unwrap();
        assert_eq!(evaluation.dataset_size, 4);
        assert_eq!(evaluation.accuracy, 1.0);
        assert!(evaluation.epoch_history.is_empty());
    }
}
