//! External collaborators of the intent engine.
//!
//! The engine does not own its training data, its persisted model, or its
//! analytics log. It talks to each of them through a small trait:
//!
//! - [`TrainingDataSource`]: intents and their labeled examples
//! - [`ModelStore`]: one opaque model record, most recent write wins
//! - [`EventSink`]: structured analytics events
//!
//! In-process implementations are provided for tests, the CLI, and hosts
//! that do not need a database.

pub mod events;
pub mod memory;
pub mod model_store;
pub mod types;

use chrono::{DateTime, Utc};

use crate::error::Result;

pub use events::{AnalyticsEvent, EventKind, EventPayload, MemoryEventLog};
pub use memory::{IntentSample, MemoryTrainingData};
pub use model_store::StorageModelStore;
pub use types::{Intent, IntentInfo, NewExample, TrainingExample};

/// Source of labeled training data.
pub trait TrainingDataSource: Send + Sync + std::fmt::Debug {
    /// All active intents, each carrying only its active examples.
    fn active_intents(&self) -> Result<Vec<Intent>>;

    /// Append one labeled example and return it as stored.
    fn append_example(&self, example: NewExample) -> Result<TrainingExample>;

    /// Look up an intent by identifier, active or not.
    fn intent(&self, id: &str) -> Result<Option<IntentInfo>>;

    /// Number of active examples created strictly after `since`.
    fn count_examples_since(&self, since: DateTime<Utc>) -> Result<usize>;
}

/// Persistence for the serialized model record.
pub trait ModelStore: Send + Sync + std::fmt::Debug {
    /// Replace the stored record.
    fn write(&self, record: &[u8]) -> Result<()>;

    /// The most recently written record, or `None` if nothing was written yet.
    fn read_latest(&self) -> Result<Option<Vec<u8>>>;
}

/// Sink for analytics events.
pub trait EventSink: Send + Sync + std::fmt::Debug {
    fn record(&self, event: AnalyticsEvent) -> Result<()>;

    /// Recorded events in insertion order, optionally filtered by kind.
    fn events(&self, kind: Option<EventKind>) -> Result<Vec<AnalyticsEvent>>;
}
