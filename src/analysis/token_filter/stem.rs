//! Stemming token filter and the suffix stemmer used by the intent engine.

use super::Filter;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for stemming algorithms.
pub trait Stemmer: Send + Sync {
    /// Stem a word to its root form.
    fn stem(&self, word: &str) -> String;

    /// Get the name of this stemmer.
    fn name(&self) -> &'static str;
}

/// Suffixes stripped by [`SuffixStemmer`], tried in this order.
pub const DEFAULT_SUFFIXES: &[&str] = &[
    "ing", "ed", "er", "est", "ly", "ion", "tion", "ness", "ment",
];

/// Light suffix-stripping stemmer.
///
/// The first suffix in list order that matches is removed, and only when the
/// word is longer than `suffix length + 2` characters. The result is not a
/// linguistic stem; it only has to be stable between training and inference.
#[derive(Debug, Clone)]
pub struct SuffixStemmer {
    suffixes: Vec<String>,
}

impl SuffixStemmer {
    pub fn new() -> Self {
        Self::with_suffixes(DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }

    /// Create a stemmer with a custom ordered suffix list.
    pub fn with_suffixes(suffixes: Vec<String>) -> Self {
        SuffixStemmer { suffixes }
    }
}

impl Default for SuffixStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for SuffixStemmer {
    fn stem(&self, word: &str) -> String {
        let word_len = word.chars().count();

        for suffix in &self.suffixes {
            if word.ends_with(suffix.as_str()) && word_len > suffix.chars().count() + 2 {
                return word[..word.len() - suffix.len()].to_string();
            }
        }

        word.to_string()
    }

    fn name(&self) -> &'static str {
        "suffix"
    }
}

/// Filter that applies stemming to tokens.
pub struct StemFilter {
    stemmer: Box<dyn Stemmer>,
}

impl std::fmt::Debug for StemFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StemFilter")
            .field("stemmer", &self.stemmer.name())
            .finish()
    }
}

impl StemFilter {
    /// Create a new stem filter with the suffix stemmer.
    pub fn new() -> Self {
        StemFilter {
            stemmer: Box::new(SuffixStemmer::new()),
        }
    }

    /// Create a stem filter with a custom stemmer.
    pub fn with_stemmer(stemmer: Box<dyn Stemmer>) -> Self {
        StemFilter { stemmer }
    }

    /// Stem a single word with this filter's stemmer.
    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(word)
    }
}

impl Default for StemFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for StemFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let stemmed = tokens
            .map(|token| {
                if token.is_stopped() {
                    token
                } else {
                    let stem = self.stemmer.stem(&token.text);
                    token.with_text(stem)
                }
            })
            .collect::<Vec<_>>();

        Ok(Box::new(stemmed.into_iter()))
    }

    fn name(&self) -> &'static str {
        "stem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_suffix_stemmer() {
        let stemmer = SuffixStemmer::new();

        assert_eq!(stemmer.stem("running"), "runn");
        assert_eq!(stemmer.stem("quickly"), "quick");
        assert_eq!(stemmer.stem("happiness"), "happi");
        assert_eq!(stemmer.stem("supplement"), "supple");
        assert_eq!(stemmer.stem("protein"), "protein");
    }

    #[test]
    fn test_first_matching_suffix_wins() {
        let stemmer = SuffixStemmer::new();
        // "ion" precedes "tion" in the list.
        assert_eq!(stemmer.stem("nutrition"), "nutrit");
        assert_eq!(stemmer.stem("recommended"), "recommend");
    }

    #[test]
    fn test_short_words_are_not_stemmed() {
        let stemmer = SuffixStemmer::new();
        assert_eq!(stemmer.stem("need"), "need");
        assert_eq!(stemmer.stem("best"), "best");
        assert_eq!(stemmer.stem("sing"), "sing");
        assert_eq!(stemmer.stem("bring"), "bring");
        assert_eq!(stemmer.stem("eating"), "eat");
    }

    #[test]
    fn test_stem_filter() {
        let filter = StemFilter::new();
        let tokens = vec![
            Token::new("eating", 0),
            Token::new("calories", 1),
            Token::new("cutting", 2).stop(),
        ];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].text, "eat");
        assert_eq!(result[1].text, "calories");
        assert_eq!(result[2].text, "cutting");
    }
}
