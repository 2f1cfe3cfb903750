//! # nutriclass
//!
//! A self-contained intent classifier for nutrition support chat.
//!
//! ## Features
//!
//! - Text analysis pipeline: normalization, stop words, suffix stemming
//! - Bounded, fingerprinted vocabulary and term-frequency feature vectors
//! - Single-layer softmax network trained by per-example gradient descent
//! - Versioned, checksummed model records over pluggable storage
//! - Training orchestration with status polling and analytics events
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use nutriclass::config::EngineConfig;
//! use nutriclass::repository::{
//!     IntentSample, MemoryEventLog, MemoryTrainingData, StorageModelStore,
//! };
//! use nutriclass::training::TrainingManager;
//!
//! # fn main() -> nutriclass::error::Result<()> {
//! let samples = [
//!     ("greeting", "hello there"),
//!     ("greeting", "hello friend"),
//!     ("protein_question", "best protein sources"),
//!     ("protein_question", "protein powder advice"),
//! ]
//! .into_iter()
//! .map(|(intent, text)| IntentSample { intent: intent.into(), text: text.into() });
//!
//! let mut config = EngineConfig::default();
//! config.text.min_word_freq = 1;
//! config.training.min_training_examples = 4;
//! config.network.seed = Some(1);
//!
//! let manager = TrainingManager::new(
//!     &config,
//!     Arc::new(MemoryTrainingData::from_samples(samples)?),
//!     Arc::new(StorageModelStore::in_memory()),
//!     Arc::new(MemoryEventLog::default()),
//! )?;
//! manager.train_model(300, true)?;
//!
//! let answer = manager.get_enhanced_prediction("any protein tips?", true);
//! assert_eq!(answer.neural_prediction.unwrap().intent_id, "protein_question");
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod ml;
pub mod repository;
pub mod storage;
pub mod text;
pub mod training;

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::error::{NutriclassError, Result};
    pub use crate::ml::{IntentClassifier, IntentPrediction, TrainingMetrics};
    pub use crate::repository::{EventSink, ModelStore, TrainingDataSource};
    pub use crate::text::{FeatureVector, TextProcessor};
    pub use crate::training::{EnhancedPrediction, TrainingManager, TrainingStatus};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
