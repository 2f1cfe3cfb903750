//! Text analysis primitives for nutriclass.
//!
//! The intent engine turns utterances into stems through a small pipeline:
//! char filters normalize the raw string, a tokenizer splits it, and token
//! filters drop short words and stop words before stemming.
//!
//! ```text
//! Raw Text → Char Filters → Tokenizer → Token Filters → Stems
//! ```

pub mod analyzer;
pub mod char_filter;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
