//! The linear intent classifier.
//!
//! [`LinearNetwork`] holds the weights and does the arithmetic: a linear layer
//! followed by softmax, trained by per-example gradient descent on the
//! cross-entropy loss. [`IntentClassifier`] wraps it with a
//! [`TextProcessor`](crate::text::TextProcessor) and the intent mapping, and
//! persists both as a versioned [`ModelRecord`].

pub mod classifier;
pub mod model;
pub mod network;
pub mod types;

pub use classifier::IntentClassifier;
pub use model::{FORMAT_VERSION, ModelRecord, ModelState};
pub use network::{LinearNetwork, argmax, softmax};
pub use types::{EpochStats, IntentPrediction, TrainingMetrics};
