//! Shared access to the current index with lock-free replacement.

use super::builder::IndexBuilder;
use super::corpus::{Corpus, DuplicatePolicy};
use super::index::InvertedIndex;
use super::query::QueryConfig;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::{Fragment, SearchResult};
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Owns the current index. Readers take a snapshot; a rebuild swaps the whole
/// index in, and snapshots taken earlier stay valid.
pub struct SearchService {
    current: ArcSwapOption<InvertedIndex>,
    builder: IndexBuilder,
    query: QueryConfig,
    duplicates: DuplicatePolicy,
    parallel: bool,
}

impl SearchService {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            current: ArcSwapOption::empty(),
            builder: IndexBuilder::new(config.tokenizer.clone(), config.scoring.clone())?,
            query: config.query,
            duplicates: config.ingest.duplicates,
            parallel: config.ingest.parallel,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    /// The current index, or `IndexNotBuilt` before the first install.
    pub fn snapshot(&self) -> Result<Arc<InvertedIndex>, SearchError> {
        self.current.load_full().ok_or(SearchError::IndexNotBuilt)
    }

    /// Replaces the current index, returning the previous one.
    pub fn install(&self, index: InvertedIndex) -> Option<Arc<InvertedIndex>> {
        tracing::debug!(
            "Installing search index ({} fragments, {} terms)",
            index.fragment_count(),
            index.term_count()
        );
        self.current.swap(Some(Arc::new(index)))
    }

    /// Builds an index from `fragments` and swaps it in. On error the current index is kept.
    pub fn rebuild(&self, fragments: Vec<Fragment>) -> Result<Arc<InvertedIndex>, SearchError> {
        self.rebuild_corpus(Corpus::with_policy(fragments, self.duplicates)?)
    }

    /// Parses a documentation payload and swaps in the index built from it.
    pub fn rebuild_from_payload(&self, payload: &str) -> Result<Arc<InvertedIndex>, SearchError> {
        self.rebuild_corpus(Corpus::from_payload(payload, self.duplicates)?)
    }

    fn rebuild_corpus(&self, corpus: Corpus) -> Result<Arc<InvertedIndex>, SearchError> {
        let index = if self.parallel {
            self.builder.build_parallel(corpus)?
        } else {
            self.builder.build(corpus)?
        };
        let index = Arc::new(index);
        self.current.store(Some(Arc::clone(&index)));
        Ok(index)
    }

    /// Searches the current index with the configured query limits.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchResult>, SearchError> {
        self.snapshot()?.search_results(query, limit, &self.query)
    }
}
