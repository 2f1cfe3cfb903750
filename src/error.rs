//! Error types for the nutriclass library.
//!
//! All fallible operations return [`Result`], whose error type is
//! [`NutriclassError`]. The domain variants follow the failure modes of the
//! classifier lifecycle: not enough data, a training run already in flight,
//! inference before a model exists, vocabulary drift between processor and
//! model, and persistence problems.
//!
//! # Examples
//!
//! ```
//! use nutriclass::error::{NutriclassError, Result};
//!
//! fn check(count: usize) -> Result<()> {
//!     if count < 50 {
//!         return Err(NutriclassError::InsufficientData {
//!             required: 50,
//!             actual: count,
//!         });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(10).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for nutriclass operations.
#[derive(Error, Debug)]
pub enum NutriclassError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Analysis-related errors (regex construction, tokenization, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Training data is below the minimum required to train.
    #[error("Insufficient training data: need at least {required} examples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A training run is already active.
    #[error("Training is already in progress")]
    TrainingInProgress,

    /// Inference or evaluation requested before a model was trained or loaded.
    #[error("Model is not ready")]
    NotReady,

    /// A feature vector was built against a different vocabulary than the model.
    #[error("Vocabulary mismatch: model expects {expected:08x}, got {actual:08x}")]
    VocabularyMismatch { expected: u32, actual: u32 },

    /// No persisted model record exists.
    #[error("No saved model found")]
    ModelNotFound,

    /// A persisted model record failed validation.
    #[error("Corrupt model record: {0}")]
    CorruptModel(String),

    /// A persisted model record was written by an unknown format version.
    #[error("Unsupported model format version: {0}")]
    UnsupportedModelVersion(u32),

    /// Unknown intent identifier.
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    /// Binary serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with NutriclassError.
pub type Result<T> = std::result::Result<T, NutriclassError>;

impl NutriclassError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        NutriclassError::Analysis(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        NutriclassError::Storage(msg.into())
    }

    /// Create a new corrupt model error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        NutriclassError::CorruptModel(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        NutriclassError::Other(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        NutriclassError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        NutriclassError::Other(format!("Invalid argument: {}", msg.into()))
    }
}
