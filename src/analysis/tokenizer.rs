//! Tokenizer trait and implementations.
//!
//! Tokenizers split normalized text into a [`TokenStream`]. The intent
//! engine only needs whitespace splitting because punctuation is already
//! removed by the char filters.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod whitespace;
