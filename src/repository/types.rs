//! Data types exchanged with the training-data source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive fields of an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentInfo {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub priority: i32,
    pub active: bool,
}

impl IntentInfo {
    /// An active intent with priority 0.
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        IntentInfo {
            id: id.into(),
            name: name.into(),
            priority: 0,
            active: true,
        }
    }
}

/// A labeled utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub id: u64,
    pub intent_id: String,
    pub text: String,
    /// Stems derived from `text` when the example was added.
    pub keywords: Vec<String>,
    pub confidence: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// An intent together with its examples and canned responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub info: IntentInfo,
    pub examples: Vec<TrainingExample>,
    #[serde(default)]
    pub responses: Vec<String>,
}

/// An example to be appended to the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExample {
    pub intent_id: String,
    pub text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub confidence: Option<f64>,
}

impl NewExample {
    pub fn new<I: Into<String>, T: Into<String>>(intent_id: I, text: T) -> Self {
        NewExample {
            intent_id: intent_id.into(),
            text: text.into(),
            keywords: Vec::new(),
            confidence: None,
        }
    }
}
