//! Text processing for intent classification.
//!
//! The [`TextProcessor`] owns the analysis pipeline and the [`Vocabulary`].
//! It turns utterances into [`FeatureVector`]s: L1-normalized term
//! frequencies over the vocabulary stems. Each vector remembers the
//! fingerprint of the vocabulary that produced it, so a vector built before a
//! vocabulary rebuild can never be fed to a model trained after it.

pub mod entities;
pub mod processor;
pub mod vocabulary;

pub use entities::{NUTRITION_KEYWORDS, extract_entities};
pub use processor::{ProcessedText, TextProcessor};
pub use vocabulary::{FeatureVector, Vocabulary};
