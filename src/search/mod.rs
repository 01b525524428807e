//! Full-text search over documentation fragments.
//!
//! This module provides tf-idf search over a fragment collection: tokenization,
//! index construction, scoring, query evaluation and the binary index format.

// Module declarations
pub mod codec;
pub(crate) mod builder;
pub(crate) mod corpus;
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod service;
pub(crate) mod snippet;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use builder::IndexBuilder;
pub use corpus::{Corpus, DuplicatePolicy};
pub use index::{FieldLengths, IndexStats, InvertedIndex, Occurrence, Posting};
pub use query::{Hit, ParsedQuery, QueryConfig};
pub use scoring::{FieldWeights, ScoringConfig};
pub use service::SearchService;
pub use tokenize::{Normalization, Token, Tokenizer, TokenizerConfig, Tokens};
