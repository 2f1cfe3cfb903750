//! In-process training-data source.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{NutriclassError, Result};
use crate::repository::TrainingDataSource;
use crate::repository::types::{Intent, IntentInfo, NewExample, TrainingExample};

/// One line of a training file: `{ "intent": "greeting", "text": "hi" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSample {
    pub intent: String,
    pub text: String,
}

/// Training data held in memory.
///
/// Intents keep insertion order, which becomes the output order of a model
/// trained from this source.
#[derive(Debug, Default)]
pub struct MemoryTrainingData {
    intents: RwLock<Vec<Intent>>,
    next_id: AtomicU64,
}

impl MemoryTrainingData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from labeled samples. Each distinct label becomes an
    /// active intent whose id and name are the label.
    pub fn from_samples<I>(samples: I) -> Result<Self>
    where
        I: IntoIterator<Item = IntentSample>,
    {
        let data = Self::new();
        for sample in samples {
            if data.intent(&sample.intent)?.is_none() {
                data.add_intent(IntentInfo::new(sample.intent.clone(), sample.intent.clone()))?;
            }
            data.append_example(NewExample::new(sample.intent, sample.text))?;
        }
        Ok(data)
    }

    /// Load samples from a JSON array file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let samples: Vec<IntentSample> = serde_json::from_str(&content)?;
        Self::from_samples(samples)
    }

    /// Register an intent. Fails if the id is already taken.
    pub fn add_intent(&self, info: IntentInfo) -> Result<()> {
        let mut intents = self.intents.write();
        if intents.iter().any(|intent| intent.info.id == info.id) {
            return Err(NutriclassError::invalid_argument(format!(
                "intent '{}' already exists",
                info.id
            )));
        }
        intents.push(Intent {
            info,
            examples: Vec::new(),
            responses: Vec::new(),
        });
        Ok(())
    }

    /// Flip the active flag of an intent. Returns false if it does not exist.
    pub fn set_intent_active(&self, id: &str, active: bool) -> bool {
        let mut intents = self.intents.write();
        match intents.iter_mut().find(|intent| intent.info.id == id) {
            Some(intent) => {
                intent.info.active = active;
                true
            }
            None => false,
        }
    }

    /// Deactivate one example. Returns false if it does not exist.
    pub fn deactivate_example(&self, example_id: u64) -> bool {
        let mut intents = self.intents.write();
        for example in intents.iter_mut().flat_map(|intent| intent.examples.iter_mut()) {
            if example.id == example_id {
                example.active = false;
                return true;
            }
        }
        false
    }

    /// Total number of active examples across active intents.
    pub fn active_example_count(&self) -> usize {
        self.intents
            .read()
            .iter()
            .filter(|intent| intent.info.active)
            .map(|intent| intent.examples.iter().filter(|e| e.active).count())
            .sum()
    }
}

impl TrainingDataSource for MemoryTrainingData {
    fn active_intents(&self) -> Result<Vec<Intent>> {
        let intents = self.intents.read();
        Ok(intents
            .iter()
            .filter(|intent| intent.info.active)
            .map(|intent| Intent {
                info: intent.info.clone(),
                examples: intent.examples.iter().filter(|e| e.active).cloned().collect(),
                responses: intent.responses.clone(),
            })
            .collect())
    }

    fn append_example(&self, example: NewExample) -> Result<TrainingExample> {
        let mut intents = self.intents.write();
        let intent = intents
            .iter_mut()
            .find(|intent| intent.info.id == example.intent_id)
            .ok_or_else(|| NutriclassError::UnknownIntent(example.intent_id.clone()))?;

        let stored = TrainingExample {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            intent_id: example.intent_id,
            text: example.text,
            keywords: example.keywords,
            confidence: example.confidence,
            active: true,
            created_at: Utc::now(),
        };
        intent.examples.push(stored.clone());
        Ok(stored)
    }

    fn intent(&self, id: &str) -> Result<Option<IntentInfo>> {
        Ok(self
            .intents
            .read()
            .iter()
            .find(|intent| intent.info.id == id)
            .map(|intent| intent.info.clone()))
    }

    fn count_examples_since(&self, since: DateTime<Utc>) -> Result<usize> {
        Ok(self
            .intents
            .read()
            .iter()
            .filter(|intent| intent.info.active)
            .flat_map(|intent| intent.examples.iter())
            .filter(|example| example.active && example.created_at > since)
            .count())
    }
}
