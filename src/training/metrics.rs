//! Read-only aggregates over the classifier and the analytics log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{AnalyticsEvent, EventPayload};

/// State of the live model and its training history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub ready: bool,
    pub accuracy: Option<f64>,
    pub loss: Option<f64>,
    pub last_training: Option<DateTime<Utc>>,
    pub training_runs: usize,
    pub vocabulary_size: usize,
    pub intent_count: usize,
    pub parameter_count: usize,
    pub total_predictions: usize,
}

/// Aggregates over logged predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionStats {
    pub total_predictions: usize,
    pub average_confidence: f64,
    /// Prediction count per intent name.
    pub intent_distribution: HashMap<String, usize>,
    /// Predictions whose confidence fell below the configured threshold.
    pub low_confidence_predictions: usize,
}

impl PredictionStats {
    pub fn from_events(events: &[AnalyticsEvent], low_confidence_threshold: f64) -> Self {
        let mut stats = PredictionStats::default();
        let mut confidence_sum = 0.0;

        for event in events {
            if let EventPayload::Prediction {
                intent_name,
                confidence,
                ..
            } = &event.payload
            {
                stats.total_predictions += 1;
                confidence_sum += confidence;
                *stats
                    .intent_distribution
                    .entry(intent_name.clone())
                    .or_insert(0) += 1;
                if *confidence < low_confidence_threshold {
                    stats.low_confidence_predictions += 1;
                }
            }
        }

        if stats.total_predictions > 0 {
            stats.average_confidence = confidence_sum / stats.total_predictions as f64;
        }
        stats
    }
}
