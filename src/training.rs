//! Training orchestration.
//!
//! [`TrainingManager`] is what callers hold: it guards the single live
//! classifier, enforces one training run at a time, tracks a
//! [`TrainingStatus`] that can be polled while a run is in flight, persists
//! and restores models, and writes analytics events.

pub mod manager;
pub mod metrics;
pub mod status;

pub use manager::{EnhancedPrediction, TrainingManager, TrainingReport};
pub use metrics::{ModelMetrics, PredictionStats};
pub use status::{TrainingStage, TrainingStatus};
