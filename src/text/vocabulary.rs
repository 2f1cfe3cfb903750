//! Vocabulary and feature vectors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{NutriclassError, Result};

/// Ordered mapping from stem to a dense index in `[0, len)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Stems ordered by index.
    terms: Vec<String>,
    /// Stem -> index lookup.
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vocabulary from stems already in index order.
    pub fn from_terms(terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Vocabulary { terms, index }
    }

    /// Rebuild a vocabulary from an exported stem -> index mapping.
    ///
    /// The indices must be exactly `0..map.len()`.
    pub fn from_map(map: &HashMap<String, usize>) -> Result<Self> {
        let mut slots: Vec<Option<String>> = vec![None; map.len()];
        for (term, &idx) in map {
            let slot = slots.get_mut(idx).ok_or_else(|| {
                NutriclassError::corrupt(format!(
                    "vocabulary index {idx} for '{term}' out of range 0..{}",
                    map.len()
                ))
            })?;
            if slot.is_some() {
                return Err(NutriclassError::corrupt(format!(
                    "duplicate vocabulary index {idx}"
                )));
            }
            *slot = Some(term.clone());
        }

        // Every slot is filled: len(map) distinct indices in 0..len(map).
        let terms = slots.into_iter().flatten().collect();
        Ok(Self::from_terms(terms))
    }

    /// Export as a plain stem -> index mapping.
    pub fn to_map(&self) -> HashMap<String, usize> {
        self.index.clone()
    }

    /// Index of a stem, if known.
    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    /// Stems in index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// CRC32 over the ordered stems. Two vocabularies with the same stems in
    /// the same order share a fingerprint.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for (idx, term) in self.terms.iter().enumerate() {
            hasher.update(&(idx as u64).to_le_bytes());
            hasher.update(term.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize()
    }
}

/// A term-frequency vector bound to the vocabulary that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
    vocabulary_fingerprint: u32,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>, vocabulary_fingerprint: u32) -> Self {
        FeatureVector {
            values,
            vocabulary_fingerprint,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Fingerprint of the vocabulary this vector was built against.
    pub fn fingerprint(&self) -> u32 {
        self.vocabulary_fingerprint
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when no vocabulary term matched.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn magnitude(&self) -> f64 {
        self.values.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Cosine similarity. Returns 0 for zero-magnitude or mismatched vectors.
    pub fn cosine_similarity(&self, other: &FeatureVector) -> f64 {
        if self.values.len() != other.values.len()
            || self.vocabulary_fingerprint != other.vocabulary_fingerprint
        {
            return 0.0;
        }

        let magnitude_a = self.magnitude();
        let magnitude_b = other.magnitude();
        if magnitude_a == 0.0 || magnitude_b == 0.0 {
            return 0.0;
        }

        let dot_product: f64 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(x, y)| x * y)
            .sum();

        dot_product / (magnitude_a * magnitude_b)
    }
}
