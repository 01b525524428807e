//! Single-pass index construction, serial or sharded across the rayon pool.

use super::corpus::Corpus;
use super::index::{FieldLengths, InvertedIndex, Occurrence, Posting};
use super::scoring::ScoringConfig;
use super::tokenize::{Tokenizer, TokenizerConfig};
use crate::error::SearchError;
use crate::types::{Field, Fragment, FragmentId};
use ahash::AHashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;

/// Smallest shard handed to a worker during a parallel build.
const MIN_SHARD_SIZE: usize = 64;

/// Postings and field lengths for a contiguous run of fragments.
struct Shard {
    terms: AHashMap<String, Vec<Posting>>,
    lengths: Vec<FieldLengths>,
}

/// Builds [`InvertedIndex`] values with a fixed tokenizer and scoring policy.
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    tokenizer: Tokenizer,
    scoring: ScoringConfig,
}

impl IndexBuilder {
    pub fn new(tokenizer: TokenizerConfig, scoring: ScoringConfig) -> Result<Self, SearchError> {
        scoring.validate()?;
        Ok(Self {
            tokenizer: Tokenizer::new(tokenizer),
            scoring,
        })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Validates raw fragments and builds an index over them.
    pub fn build_fragments(&self, fragments: Vec<Fragment>) -> Result<InvertedIndex, SearchError> {
        self.build(Corpus::new(fragments)?)
    }

    /// Builds an index in one pass over the corpus.
    pub fn build(&self, corpus: Corpus) -> Result<InvertedIndex, SearchError> {
        if corpus.is_empty() {
            return Err(SearchError::EmptyCollection);
        }
        let start = Instant::now();
        let shard = self.index_shard(corpus.fragments(), 0);
        Ok(self.finish(corpus, vec![shard], start))
    }

    /// Builds an index by sharding the corpus across worker threads.
    ///
    /// Shards cover contiguous id ranges and are merged in id order, so the
    /// result is identical to [`IndexBuilder::build`].
    pub fn build_parallel(&self, corpus: Corpus) -> Result<InvertedIndex, SearchError> {
        if corpus.is_empty() {
            return Err(SearchError::EmptyCollection);
        }
        let start = Instant::now();
        let shard_size = corpus
            .len()
            .div_ceil(rayon::current_num_threads() * 4)
            .max(MIN_SHARD_SIZE);

        let shards: Vec<Shard> = corpus
            .fragments()
            .par_chunks(shard_size)
            .enumerate()
            .map(|(i, chunk)| self.index_shard(chunk, (i * shard_size) as FragmentId))
            .collect();

        tracing::debug!(
            "Indexed {} fragments in {} shards of up to {}",
            corpus.len(),
            shards.len(),
            shard_size
        );
        Ok(self.finish(corpus, shards, start))
    }

    /// Tokenizes every field of every fragment in `fragments`, whose first id is `first_id`.
    fn index_shard(&self, fragments: &[Fragment], first_id: FragmentId) -> Shard {
        let mut terms: AHashMap<String, Vec<Posting>> = AHashMap::new();
        let mut lengths = Vec::with_capacity(fragments.len());
        // Per-fragment accumulator, reused across fragments.
        let mut current: AHashMap<String, Posting> = AHashMap::new();

        for (offset, fragment) in fragments.iter().enumerate() {
            let id = first_id + offset as FragmentId;
            let mut field_lengths = FieldLengths::default();

            for field in Field::ALL {
                let mut count = 0;
                for token in self.tokenizer.tokens(fragment.field(field)) {
                    count += 1;
                    current
                        .entry(token.term)
                        .or_insert_with(|| Posting::new(id))
                        .record(Occurrence {
                            field,
                            position: token.position,
                            // Corpus validation caps fields at u32::MAX bytes.
                            start: token.start as u32,
                            end: token.end as u32,
                        });
                }
                field_lengths.set(field, count);
            }

            // Fragments arrive in id order, so each postings list stays sorted.
            for (term, posting) in current.drain() {
                terms.entry(term).or_default().push(posting);
            }
            lengths.push(field_lengths);
        }

        Shard { terms, lengths }
    }

    /// Merges shards in id order into the final canonical index.
    fn finish(&self, corpus: Corpus, shards: Vec<Shard>, start: Instant) -> InvertedIndex {
        let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        let mut lengths = Vec::with_capacity(corpus.len());

        for shard in shards {
            for (term, postings) in shard.terms {
                terms.entry(term).or_default().extend(postings);
            }
            lengths.extend(shard.lengths);
        }

        let index = InvertedIndex::new(
            corpus.into_fragments(),
            terms,
            lengths,
            self.tokenizer.clone(),
            self.scoring.clone(),
        );

        let stats = index.stats();
        tracing::info!(
            "Built search index: {} unique terms, {} fragments, {} postings in {:?}",
            stats.terms,
            stats.fragments,
            stats.postings,
            start.elapsed()
        );

        index
    }
}
