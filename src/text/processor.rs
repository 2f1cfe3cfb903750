//! The text processor: normalization, stemming, vocabulary and vectors.

use std::collections::HashMap;
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::char_filter::lowercase::LowercaseCharFilter;
use crate::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
use crate::analysis::char_filter::trim::TrimCharFilter;
use crate::analysis::token::{IntoTokenStream, Token};
use crate::analysis::token_filter::length::LengthFilter;
use crate::analysis::token_filter::stem::{StemFilter, Stemmer, SuffixStemmer};
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::whitespace::WhitespaceTokenizer;
use crate::config::TextProcessorConfig;
use crate::error::Result;
use crate::text::entities::extract_entities;
use crate::text::vocabulary::{FeatureVector, Vocabulary};

/// Every intermediate artifact of processing one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedText {
    pub original: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    pub stems: Vec<String>,
    pub entities: Vec<String>,
    pub features: FeatureVector,
}

/// Maps text to feature vectors over a rebuildable vocabulary.
pub struct TextProcessor {
    config: TextProcessorConfig,
    analyzer: PipelineAnalyzer,
    tokenizer: WhitespaceTokenizer,
    stemmer: SuffixStemmer,
    vocabulary: Vocabulary,
}

impl std::fmt::Debug for TextProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextProcessor")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer.name())
            .field("vocabulary_size", &self.vocabulary.len())
            .finish()
    }
}

impl TextProcessor {
    /// Create a processor with an empty vocabulary.
    pub fn new(config: TextProcessorConfig) -> Result<Self> {
        let stop_filter = match &config.stop_words {
            Some(words) => StopFilter::from_words(words.iter().cloned()),
            None => StopFilter::new(),
        };

        let analyzer = PipelineAnalyzer::new(Arc::new(WhitespaceTokenizer::new()))
            .add_char_filter(Arc::new(LowercaseCharFilter::new()))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::new(r"[^\w\s]", " ")?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::new(
                r"\d+",
                &config.number_placeholder,
            )?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::new(r"\s+", " ")?))
            .add_char_filter(Arc::new(TrimCharFilter::new()))
            .add_filter(Arc::new(LengthFilter::new(config.min_token_length)))
            .add_filter(Arc::new(stop_filter))
            .add_filter(Arc::new(StemFilter::new()))
            .with_name("intent");

        Ok(TextProcessor {
            config,
            analyzer,
            tokenizer: WhitespaceTokenizer::new(),
            stemmer: SuffixStemmer::new(),
            vocabulary: Vocabulary::new(),
        })
    }

    pub fn config(&self) -> &TextProcessorConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Lowercase, blank out punctuation, replace digit runs with the
    /// placeholder, collapse whitespace and trim.
    ///
    /// Letter, digit and whitespace classes are Unicode-aware: accented
    /// letters are kept and any decimal digit counts as a number.
    pub fn normalize(&self, text: &str) -> String {
        self.analyzer.normalize(text)
    }

    /// Split normalized text on whitespace.
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.tokenizer.tokenize(text)?.map(|t| t.text).collect())
    }

    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(word)
    }

    /// Nutrition keywords mentioned in the text.
    pub fn extract_entities(&self, text: &str) -> Vec<String> {
        extract_entities(text)
    }

    /// Length-filtered, stop-word-filtered stems of a raw text.
    pub fn stems(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyzer.analyze(text)?.map(|t| t.text).collect())
    }

    /// Rebuild the vocabulary from a corpus, replacing any previous one.
    ///
    /// Stems below `min_word_freq` are dropped; the rest are ranked by
    /// descending corpus frequency (ties by stem) and cut at
    /// `max_vocab_size`.
    pub fn build_vocabulary<S: AsRef<str> + Sync>(&mut self, texts: &[S]) -> Result<()> {
        let this = &*self;
        let per_text: Vec<Vec<String>> = texts
            .par_iter()
            .map(|text| this.stems(text.as_ref()))
            .collect::<Result<_>>()?;

        let mut frequencies: AHashMap<String, usize> = AHashMap::new();
        for stem in per_text.into_iter().flatten() {
            *frequencies.entry(stem).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, usize)> = frequencies
            .into_iter()
            .filter(|(_, count)| *count >= self.config.min_word_freq)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.config.max_vocab_size);

        self.vocabulary = Vocabulary::from_terms(ranked.into_iter().map(|(s, _)| s).collect());
        debug!(
            "built vocabulary of {} stems from {} texts",
            self.vocabulary.len(),
            texts.len()
        );

        Ok(())
    }

    /// Run the whole pipeline once and keep every intermediate result.
    pub fn process_text(&self, text: &str) -> Result<ProcessedText> {
        let normalized = self.normalize(text);
        let tokens = self.tokenize(&normalized)?;

        let token_stream = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| Token::new(t.as_str(), i))
            .collect::<Vec<_>>()
            .into_token_stream();
        let stems: Vec<String> = self
            .analyzer
            .apply_filters(token_stream)?
            .map(|t| t.text)
            .collect();

        let features = self.text_to_vector(&stems);

        Ok(ProcessedText {
            original: text.to_string(),
            entities: self.extract_entities(text),
            normalized,
            tokens,
            stems,
            features,
        })
    }

    /// Feature vector of a raw text against the current vocabulary.
    pub fn vectorize(&self, text: &str) -> Result<FeatureVector> {
        Ok(self.text_to_vector(&self.stems(text)?))
    }

    /// Count vocabulary hits and divide by the total hit count.
    ///
    /// Stems outside the vocabulary are ignored; with no hits the vector
    /// stays all zero.
    pub fn text_to_vector<S: AsRef<str>>(&self, stems: &[S]) -> FeatureVector {
        let mut values = vec![0.0; self.vocabulary.len()];
        let mut total = 0usize;

        for stem in stems {
            if let Some(idx) = self.vocabulary.get(stem.as_ref()) {
                values[idx] += 1.0;
                total += 1;
            }
        }

        if total > 0 {
            let total = total as f64;
            for value in &mut values {
                *value /= total;
            }
        }

        FeatureVector::new(values, self.vocabulary.fingerprint())
    }

    /// Cosine similarity between the feature vectors of two texts.
    pub fn calculate_similarity(&self, text_a: &str, text_b: &str) -> Result<f64> {
        let a = self.vectorize(text_a)?;
        let b = self.vectorize(text_b)?;
        Ok(a.cosine_similarity(&b))
    }

    /// Export the vocabulary as a stem -> index map.
    pub fn export_vocabulary(&self) -> HashMap<String, usize> {
        self.vocabulary.to_map()
    }

    /// Replace the vocabulary with an exported map.
    pub fn import_vocabulary(&mut self, map: &HashMap<String, usize>) -> Result<()> {
        self.vocabulary = Vocabulary::from_map(map)?;
        Ok(())
    }

    pub(crate) fn set_vocabulary(&mut self, vocabulary: Vocabulary) {
        self.vocabulary = vocabulary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(min_word_freq: usize) -> TextProcessor {
        TextProcessor::new(TextProcessorConfig {
            min_word_freq,
            ..TextProcessorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_normalize() {
        let p = processor(1);
        assert_eq!(p.normalize("  How much PROTEIN, in 25g?? "), "how much protein in NUMg");
        assert_eq!(p.normalize("30g"), p.normalize("25g"));
        assert_eq!(p.normalize("a\t\tb\n c"), "a b c");
        assert_eq!(p.normalize("!!!"), "");
    }

    #[test]
    fn test_normalize_is_unicode_aware() {
        let p = processor(1);
        assert_eq!(p.normalize("Café CRÈME, 2 cups"), "café crème NUM cups");
        assert_eq!(p.normalize("\u{0663} eggs"), "NUM eggs");
        assert_eq!(p.normalize("protein\u{2014}shake\u{00a0}bar"), "protein shake bar");
        assert_eq!(p.stems("Crème brûlée").unwrap(), vec!["crème", "brûlée"]);
    }

    #[test]
    fn test_tokenize_drops_empty() {
        let p = processor(1);
        assert_eq!(p.tokenize("best  protein ").unwrap(), vec!["best", "protein"]);
        assert!(p.tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_process_text() {
        let p = processor(1);
        let processed = p.process_text("What protein should I be eating?").unwrap();

        assert_eq!(processed.normalized, "what protein should i be eating");
        assert_eq!(processed.tokens.len(), 6);
        assert_eq!(processed.stems, vec!["protein", "eat"]);
        assert_eq!(processed.entities, vec!["protein"]);
        // Empty vocabulary: nothing can match.
        assert!(processed.features.is_empty());
    }

    #[test]
    fn test_build_vocabulary_ranks_by_frequency() {
        let mut p = processor(2);
        p.build_vocabulary(&[
            "protein shake recipe",
            "protein bar",
            "shake it",
            "protein powder",
            "vitamin",
        ])
        .unwrap();

        assert_eq!(p.vocabulary().terms(), &["protein".to_string(), "shake".to_string()]);
    }

    #[test]
    fn test_build_vocabulary_is_deterministic() {
        let corpus = [
            "hello there",
            "how much protein do I need",
            "best protein sources",
            "calories in eggs",
            "egg protein calories",
        ];
        let mut a = processor(1);
        let mut b = processor(1);
        a.build_vocabulary(&corpus).unwrap();
        b.build_vocabulary(&corpus).unwrap();

        assert_eq!(a.export_vocabulary(), b.export_vocabulary());
        assert_eq!(a.vocabulary().fingerprint(), b.vocabulary().fingerprint());
        assert_eq!(a.vocabulary().get("protein"), Some(0));
    }

    #[test]
    fn test_build_vocabulary_respects_max_size() {
        let mut p = TextProcessor::new(TextProcessorConfig {
            max_vocab_size: 2,
            min_word_freq: 1,
            ..TextProcessorConfig::default()
        })
        .unwrap();
        p.build_vocabulary(&["alpha beta gamma delta", "alpha beta", "alpha"])
            .unwrap();

        assert_eq!(p.vocabulary_size(), 2);
        assert_eq!(p.vocabulary().terms(), &["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_rebuild_replaces_vocabulary() {
        let mut p = processor(1);
        p.build_vocabulary(&["protein sources"]).unwrap();
        p.build_vocabulary(&["calorie counting"]).unwrap();
        assert!(!p.vocabulary().contains("protein"));
        assert!(p.vocabulary().contains("calorie"));
    }

    #[test]
    fn test_text_to_vector_sums_to_one() {
        let mut p = processor(1);
        p.build_vocabulary(&["protein sources", "protein calorie"]).unwrap();

        let v = p.text_to_vector(&["protein", "protein", "calorie", "unknown"]);
        assert_eq!(v.len(), 3);
        assert!((v.sum() - 1.0).abs() < 1e-12);
        let protein = p.vocabulary().get("protein").unwrap();
        assert!((v.values()[protein] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_text_to_vector_zero_when_no_match() {
        let mut p = processor(1);
        p.build_vocabulary(&["protein sources"]).unwrap();

        let v = p.text_to_vector(&["pizza"]);
        assert_eq!(v.len(), 2);
        assert!(v.is_zero());

        let empty: [&str; 0] = [];
        assert!(p.text_to_vector(&empty).is_zero());
        assert!(p.vectorize("hi").unwrap().is_zero());
    }

    #[test]
    fn test_vector_bound_to_vocabulary() {
        let mut p = processor(1);
        p.build_vocabulary(&["protein sources"]).unwrap();
        let before = p.vectorize("protein").unwrap();
        p.build_vocabulary(&["protein calories"]).unwrap();
        let after = p.vectorize("protein").unwrap();

        assert_ne!(before.fingerprint(), after.fingerprint());
    }

    #[test]
    fn test_calculate_similarity() {
        let mut p = processor(1);
        p.build_vocabulary(&["protein sources", "calorie intake"]).unwrap();

        let same = p.calculate_similarity("protein sources", "sources of protein").unwrap();
        assert!((same - 1.0).abs() < 1e-9);

        let disjoint = p.calculate_similarity("protein", "calorie").unwrap();
        assert_eq!(disjoint, 0.0);

        assert_eq!(p.calculate_similarity("hi", "protein").unwrap(), 0.0);
    }

    #[test]
    fn test_vocabulary_export_import() {
        let mut p = processor(1);
        p.build_vocabulary(&["protein sources", "calorie intake"]).unwrap();
        let exported = p.export_vocabulary();

        let mut fresh = processor(1);
        fresh.import_vocabulary(&exported).unwrap();

        assert_eq!(fresh.vocabulary(), p.vocabulary());
        assert_eq!(
            fresh.vectorize("protein intake").unwrap(),
            p.vectorize("protein intake").unwrap()
        );
    }
}
