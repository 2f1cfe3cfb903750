//! Analytics events emitted by the training orchestrator.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::repository::EventSink;

/// Discriminant of [`EventPayload`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TrainingCompleted,
    Prediction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    TrainingCompleted {
        accuracy: f64,
        loss: f64,
        epochs: usize,
        dataset_size: usize,
    },
    Prediction {
        /// Input text, truncated.
        text: String,
        intent_id: String,
        intent_name: String,
        confidence: f64,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::TrainingCompleted { .. } => EventKind::TrainingCompleted,
            EventPayload::Prediction { .. } => EventKind::Prediction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl AnalyticsEvent {
    /// A new event stamped with the current time.
    pub fn new(payload: EventPayload) -> Self {
        AnalyticsEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// A new event stamped with an explicit time.
    pub fn at(payload: EventPayload, timestamp: DateTime<Utc>) -> Self {
        AnalyticsEvent {
            timestamp,
            ..Self::new(payload)
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// Bounded in-memory event log.
///
/// Once `capacity` is reached the oldest prediction is evicted. Training
/// records are only ever evicted by newer training records, so the last
/// completed run stays visible to staleness checks.
#[derive(Debug)]
pub struct MemoryEventLog {
    events: Mutex<VecDeque<AnalyticsEvent>>,
    capacity: usize,
}

impl MemoryEventLog {
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn new(capacity: usize) -> Self {
        MemoryEventLog {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl EventSink for MemoryEventLog {
    fn record(&self, event: AnalyticsEvent) -> Result<()> {
        let mut events = self.events.lock();
        while events.len() >= self.capacity {
            match events.iter().position(|e| e.kind() == EventKind::Prediction) {
                Some(oldest) => {
                    events.remove(oldest);
                }
                // Full of training records: a prediction never displaces them.
                None if event.kind() == EventKind::Prediction => return Ok(()),
                None => {
                    events.pop_front();
                }
            }
        }
        events.push_back(event);
        Ok(())
    }

    fn events(&self, kind: Option<EventKind>) -> Result<Vec<AnalyticsEvent>> {
        let events = self.events.lock();
        Ok(events
            .iter()
            .filter(|event| kind.is_none_or(|k| event.kind() == k))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(confidence: f64) -> AnalyticsEvent {
        AnalyticsEvent::new(EventPayload::Prediction {
            text: "hello".to_string(),
            intent_id: "greeting".to_string(),
            intent_name: "Greeting".to_string(),
            confidence,
        })
    }

    #[test]
    fn test_filter_by_kind() {
        let log = MemoryEventLog::default();
        log.record(prediction(0.9)).unwrap();
        log.record(AnalyticsEvent::new(EventPayload::TrainingCompleted {
            accuracy: 1.0,
            loss: 0.1,
            epochs: 10,
            dataset_size: 4,
        }))
        .unwrap();

        assert_eq!(log.events(None).unwrap().len(), 2);
        let trained = log.events(Some(EventKind::TrainingCompleted)).unwrap();
        assert_eq!(trained.len(), 1);
        assert_eq!(trained[0].kind(), EventKind::TrainingCompleted);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = MemoryEventLog::new(2);
        log.record(prediction(0.1)).unwrap();
        log.record(prediction(0.2)).unwrap();
        log.record(prediction(0.3)).unwrap();

        let events = log.events(None).unwrap();
        assert_eq!(events.len(), 2);
        match &events[0].payload {
            EventPayload::Prediction { confidence, .. } => assert_eq!(*confidence, 0.2),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    fn training(epochs: usize) -> AnalyticsEvent {
        AnalyticsEvent::new(EventPayload::TrainingCompleted {
            accuracy: 1.0,
            loss: 0.1,
            epochs,
            dataset_size: 4,
        })
    }

    #[test]
    fn test_capacity_keeps_training_records() {
        let log = MemoryEventLog::new(3);
        log.record(training(10)).unwrap();
        for i in 0..20 {
            log.record(prediction(i as f64 / 20.0)).unwrap();
        }

        assert_eq!(log.len(), 3);
        let trained = log.events(Some(EventKind::TrainingCompleted)).unwrap();
        assert_eq!(trained.len(), 1);

        let kinds: Vec<EventKind> = log.events(None).unwrap().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::TrainingCompleted,
                EventKind::Prediction,
                EventKind::Prediction
            ]
        );
    }

    #[test]
    fn test_training_records_evicted_only_when_alone() {
        let log = MemoryEventLog::new(2);
        log.record(training(1)).unwrap();
        log.record(training(2)).unwrap();
        log.record(training(3)).unwrap();

        let epochs: Vec<usize> = log
            .events(None)
            .unwrap()
            .iter()
            .map(|e| match e.payload {
                EventPayload::TrainingCompleted { epochs, .. } => epochs,
                _ => 0,
            })
            .collect();
        assert_eq!(epochs, vec![2, 3]);
    }

    #[test]
    fn test_prediction_never_displaces_training() {
        let log = MemoryEventLog::new(1);
        log.record(training(5)).unwrap();
        log.record(prediction(0.9)).unwrap();

        let events = log.events(None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::TrainingCompleted);
    }

    #[test]
    fn test_payload_json_shape() {
        let json = serde_json::to_value(prediction(0.5).payload).unwrap();
        assert_eq!(json["type"], "prediction");
        assert_eq!(json["intent_id"], "greeting");
    }
}
