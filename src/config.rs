//! Engine configuration.
//!
//! Every tunable of the intent engine lives here with its default. The
//! configuration is plain serde data so it can be read from a JSON file:
//!
//! ```
//! use nutriclass::config::EngineConfig;
//!
//! let config: EngineConfig =
//!     serde_json::from_str(r#"{ "training": { "min_training_examples": 20 } }"#).unwrap();
//! assert_eq!(config.training.min_training_examples, 20);
//! assert_eq!(config.training.retrain_threshold, 10);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NutriclassError, Result};

/// Configuration for the text processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextProcessorConfig {
    /// Maximum number of stems kept in the vocabulary.
    pub max_vocab_size: usize,
    /// Stems seen fewer times than this across the corpus are discarded.
    pub min_word_freq: usize,
    /// Tokens with fewer characters than this are dropped.
    pub min_token_length: usize,
    /// Literal that replaces every run of digits.
    pub number_placeholder: String,
    /// Custom stop words. `None` uses the built-in English list.
    pub stop_words: Option<Vec<String>>,
}

impl Default for TextProcessorConfig {
    fn default() -> Self {
        Self {
            max_vocab_size: 1000,
            min_word_freq: 2,
            min_token_length: 3,
            number_placeholder: "NUM".to_string(),
            stop_words: None,
        }
    }
}

/// Configuration for the linear network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Step size of every gradient update.
    pub learning_rate: f64,
    /// Weights and biases start uniformly in `[-init_range, init_range]`.
    pub init_range: f64,
    /// Lower clamp applied to probabilities before taking a logarithm.
    pub log_epsilon: f64,
    /// Seed for weight initialization. `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            init_range: 0.05,
            log_epsilon: 1e-15,
            seed: None,
        }
    }
}

/// Configuration for the training orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Epochs used by a full training run.
    pub epochs: usize,
    /// Epochs used by a refresh run.
    pub retrain_epochs: usize,
    /// Minimum number of active examples required before training.
    pub min_training_examples: usize,
    /// New examples since the last completed run that make the model stale.
    pub retrain_threshold: usize,
    /// Number of ranked predictions returned by enhanced prediction.
    pub top_k: usize,
    /// Input text is truncated to this many characters in prediction events.
    pub prediction_log_chars: usize,
    /// Predictions below this confidence are counted as low confidence.
    pub low_confidence_threshold: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            retrain_epochs: 50,
            min_training_examples: 50,
            retrain_threshold: 10,
            top_k: 3,
            prediction_log_chars: 100,
            low_confidence_threshold: 0.5,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub text: TextProcessorConfig,
    pub network: NetworkConfig,
    pub training: TrainingConfig,
}

impl EngineConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a working model.
    pub fn validate(&self) -> Result<()> {
        if self.text.max_vocab_size == 0 {
            return Err(NutriclassError::invalid_config("max_vocab_size must be > 0"));
        }
        if self.text.min_word_freq == 0 {
            return Err(NutriclassError::invalid_config("min_word_freq must be > 0"));
        }
        if !(self.network.learning_rate > 0.0 && self.network.learning_rate.is_finite()) {
            return Err(NutriclassError::invalid_config(
                "learning_rate must be a positive finite number",
            ));
        }
        if !(self.network.init_range >= 0.0 && self.network.init_range.is_finite()) {
            return Err(NutriclassError::invalid_config(
                "init_range must be a non-negative finite number",
            ));
        }
        if !(self.network.log_epsilon > 0.0 && self.network.log_epsilon < 1.0) {
            return Err(NutriclassError::invalid_config(
                "log_epsilon must be in (0, 1)",
            ));
        }
        if self.training.epochs == 0 || self.training.retrain_epochs == 0 {
            return Err(NutriclassError::invalid_config("epoch counts must be > 0"));
        }
        if self.training.top_k == 0 {
            return Err(NutriclassError::invalid_config("top_k must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.text.max_vocab_size, 1000);
        assert_eq!(config.network.learning_rate, 0.01);
        assert_eq!(config.training.min_training_examples, 50);
        assert_eq!(config.training.retrain_threshold, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.network.learning_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.text.max_vocab_size = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.training.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(
            &path,
            r#"{ "network": { "learning_rate": 0.05, "seed": 7 }, "text": { "min_word_freq": 1 } }"#,
        )
        .unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.network.learning_rate, 0.05);
        assert_eq!(config.network.seed, Some(7));
        assert_eq!(config.text.min_word_freq, 1);
        assert_eq!(config.text.max_vocab_size, 1000);
    }
}
