//! Persistable model state and its binary record format.
//!
//! A record is laid out as:
//!
//! ```text
//! MAGIC (4 bytes) | format version (u32 LE) | bincode(ModelState) | crc32 (u32 LE)
//! ```
//!
//! The checksum covers everything before it. Decoding rejects foreign or torn
//! records with [`NutriclassError::CorruptModel`] and records from another
//! format version with [`NutriclassError::UnsupportedModelVersion`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NutriclassError, Result};
use crate::text::Vocabulary;

/// Leading bytes of every model record.
pub const MAGIC: [u8; 4] = *b"NCIM";

/// Format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = MAGIC.len() + 4;
const CHECKSUM_LEN: usize = 4;

/// Everything needed to restore a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// `[intents][vocabulary]` weight matrix.
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    /// Exported stem -> index mapping.
    pub vocabulary: HashMap<String, usize>,
    pub vocabulary_fingerprint: u32,
    /// Output index -> intent id.
    pub index_to_intent: Vec<String>,
    pub intent_to_index: HashMap<String, usize>,
    /// Intent names at training time, by output index.
    pub intent_names: Vec<String>,
    pub trained: bool,
    pub trained_at: Option<DateTime<Utc>>,
}

impl ModelState {
    /// Check internal consistency and return the restored vocabulary.
    pub fn validate(&self) -> Result<Vocabulary> {
        let outputs = self.index_to_intent.len();
        if self.weights.len() != outputs || self.biases.len() != outputs {
            return Err(NutriclassError::corrupt(format!(
                "{outputs} intents but {} weight rows and {} biases",
                self.weights.len(),
                self.biases.len()
            )));
        }
        if self.intent_names.len() != outputs || self.intent_to_index.len() != outputs {
            return Err(NutriclassError::corrupt("intent mappings disagree in size"));
        }
        for (idx, id) in self.index_to_intent.iter().enumerate() {
            if self.intent_to_index.get(id) != Some(&idx) {
                return Err(NutriclassError::corrupt(format!(
                    "intent '{id}' does not map back to index {idx}"
                )));
            }
        }

        let vocabulary = Vocabulary::from_map(&self.vocabulary)?;
        if let Some(row) = self.weights.iter().find(|row| row.len() != vocabulary.len()) {
            return Err(NutriclassError::corrupt(format!(
                "weight row has {} entries, vocabulary has {}",
                row.len(),
                vocabulary.len()
            )));
        }
        if vocabulary.fingerprint() != self.vocabulary_fingerprint {
            return Err(NutriclassError::VocabularyMismatch {
                expected: self.vocabulary_fingerprint,
                actual: vocabulary.fingerprint(),
            });
        }

        Ok(vocabulary)
    }
}

/// A versioned model record.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub format_version: u32,
    pub state: ModelState,
}

impl ModelRecord {
    pub fn new(state: ModelState) -> Self {
        ModelRecord {
            format_version: FORMAT_VERSION,
            state,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&self.state)?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&self.format_version.to_le_bytes());
        bytes.extend_from_slice(&payload);
        let checksum = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());

        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(NutriclassError::corrupt(format!(
                "record too short ({} bytes)",
                bytes.len()
            )));
        }
        if bytes[..MAGIC.len()] != MAGIC {
            return Err(NutriclassError::corrupt("bad magic"));
        }

        let (body, tail) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        let stored = u32::from_le_bytes(read_array(tail)?);
        let actual = crc32fast::hash(body);
        if stored != actual {
            return Err(NutriclassError::corrupt(format!(
                "checksum mismatch: stored {stored:08x}, computed {actual:08x}"
            )));
        }

        let format_version = u32::from_le_bytes(read_array(&body[MAGIC.len()..HEADER_LEN])?);
        if format_version != FORMAT_VERSION {
            return Err(NutriclassError::UnsupportedModelVersion(format_version));
        }

        let state: ModelState = bincode::deserialize(&body[HEADER_LEN..])
            .map_err(|e| NutriclassError::corrupt(format!("payload: {e}")))?;

        Ok(ModelRecord {
            format_version,
            state,
        })
    }
}

fn read_array(bytes: &[u8]) -> Result<[u8; 4]> {
    bytes
        .try_into()
        .map_err(|_| NutriclassError::corrupt("truncated integer field"))
}
