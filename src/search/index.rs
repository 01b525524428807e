//! Inverted index: term → postings sorted by fragment id, plus per-fragment
//! field statistics and the policies the index was built with.

use super::scoring::{self, ScoringConfig};
use super::tokenize::{Tokenizer, TokenizerConfig};
use crate::error::SearchError;
use crate::types::{Field, Fragment, FragmentId};
use rapidfuzz::distance::jaro_winkler;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum Jaro–Winkler similarity for a vocabulary term to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// One occurrence of a term inside a fragment field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Occurrence {
    pub field: Field,
    /// Token position within the field (counts emitted tokens only).
    pub position: u32,
    /// Byte span of the source word in the field text.
    pub start: u32,
    pub end: u32,
}

/// A term's presence in one fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub fragment: FragmentId,
    /// Term frequency per field, indexed by [`Field::index`].
    frequencies: [u32; 3],
    /// Sorted by (field, position).
    occurrences: Vec<Occurrence>,
}

impl Posting {
    pub(crate) const fn new(fragment: FragmentId) -> Self {
        Self {
            fragment,
            frequencies: [0; 3],
            occurrences: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, occurrence: Occurrence) {
        self.frequencies[occurrence.field.index()] += 1;
        self.occurrences.push(occurrence);
    }

    /// Total term frequency across all fields.
    pub fn tf(&self) -> u32 {
        self.frequencies.iter().sum()
    }

    pub const fn field_tf(&self, field: Field) -> u32 {
        self.frequencies[field.index()]
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Occurrences restricted to one field.
    pub fn occurrences_in(&self, field: Field) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(move |o| o.field == field)
    }

    /// Whether the term occurs at `position` of `field`.
    pub fn has_position(&self, field: Field, position: u32) -> bool {
        self.occurrences
            .binary_search_by(|o| (o.field, o.position).cmp(&(field, position)))
            .is_ok()
    }

    /// Field-weighted term frequency for this fragment.
    pub(crate) fn weighted_tf(&self, scoring: &ScoringConfig) -> f32 {
        Field::ALL
            .iter()
            .map(|&field| self.field_tf(field) as f32 * scoring.field_weight(field))
            .sum()
    }

    /// Checks every occurrence against the fragment it points into: positions must
    /// be below the field's token count and spans must be non-empty char-aligned
    /// ranges of the field text.
    fn check_spans(&self, fragment: &Fragment, lengths: FieldLengths) -> Result<(), String> {
        for occurrence in &self.occurrences {
            let field = occurrence.field;
            let length = lengths.get(field);
            if occurrence.position >= length {
                return Err(format!(
                    "position {} outside {} field of {} tokens",
                    occurrence.position,
                    field.name(),
                    length
                ));
            }
            let text = fragment.field(field);
            let (start, end) = (occurrence.start as usize, occurrence.end as usize);
            let valid = start < end
                && end <= text.len()
                && text.is_char_boundary(start)
                && text.is_char_boundary(end);
            if !valid {
                return Err(format!(
                    "span {start}..{end} outside {} field of {} bytes",
                    field.name(),
                    text.len()
                ));
            }
        }
        Ok(())
    }

    fn is_consistent(&self) -> bool {
        let counted = self.occurrences.len() as u64;
        let declared: u64 = self.frequencies.iter().map(|&f| u64::from(f)).sum();
        counted == declared
            && counted > 0
            && self.occurrences.windows(2).all(|pair| pair[0] < pair[1])
            && Field::ALL.iter().all(|&field| {
                self.occurrences_in(field).count() as u32 == self.field_tf(field)
            })
    }
}

/// Token counts per field for one fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLengths([u32; 3]);

impl FieldLengths {
    pub const fn get(&self, field: Field) -> u32 {
        self.0[field.index()]
    }

    pub(crate) fn set(&mut self, field: Field, length: u32) {
        self.0[field.index()] = length;
    }
}

/// Summary numbers for logging and `inspect` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub fragments: usize,
    pub terms: usize,
    pub postings: usize,
    pub occurrences: usize,
    pub avg_title_len: f32,
    pub avg_page_len: f32,
    pub avg_text_len: f32,
}

/// A built, immutable full-text index over one fragment collection.
#[derive(Debug, Clone)]
pub struct InvertedIndex {
    fragments: Vec<Fragment>,
    /// Ordered map so iteration, and therefore encoding, is canonical.
    terms: BTreeMap<String, Vec<Posting>>,
    lengths: Vec<FieldLengths>,
    tokenizer: Tokenizer,
    scoring: ScoringConfig,
}

impl InvertedIndex {
    pub(super) const fn new(
        fragments: Vec<Fragment>,
        terms: BTreeMap<String, Vec<Posting>>,
        lengths: Vec<FieldLengths>,
        tokenizer: Tokenizer,
        scoring: ScoringConfig,
    ) -> Self {
        Self {
            fragments,
            terms,
            lengths,
            tokenizer,
            scoring,
        }
    }

    /// The tokenizer this index was built with. Queries must go through it.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Get the number of fragments in the index
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Get the number of unique terms in the index
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.get(id as usize)
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn field_lengths(&self, id: FragmentId) -> Option<FieldLengths> {
        self.lengths.get(id as usize).copied()
    }

    /// Postings for a normalized term, sorted by fragment id.
    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.terms.get(term).map(Vec::as_slice)
    }

    /// The posting of `term` in one fragment, if any.
    pub fn posting(&self, term: &str, fragment: FragmentId) -> Option<&Posting> {
        let postings = self.postings(term)?;
        postings
            .binary_search_by_key(&fragment, |p| p.fragment)
            .ok()
            .map(|i| &postings[i])
    }

    /// Number of fragments containing `term`.
    pub fn doc_freq(&self, term: &str) -> usize {
        self.postings(term).map_or(0, <[Posting]>::len)
    }

    pub fn idf(&self, term: &str) -> f32 {
        scoring::idf(self.fragment_count(), self.doc_freq(term))
    }

    /// Iterates the vocabulary in lexical order.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn stats(&self) -> IndexStats {
        let postings = self.terms.values().map(Vec::len).sum();
        let occurrences = self
            .terms
            .values()
            .flatten()
            .map(|posting| posting.occurrences.len())
            .sum();
        let average = |field: Field| {
            let total: u64 = self.lengths.iter().map(|l| u64::from(l.get(field))).sum();
            total as f32 / self.lengths.len().max(1) as f32
        };
        IndexStats {
            fragments: self.fragment_count(),
            terms: self.term_count(),
            postings,
            occurrences,
            avg_title_len: average(Field::Title),
            avg_page_len: average(Field::Page),
            avg_text_len: average(Field::Text),
        }
    }

    /// Suggests vocabulary terms close to `word`, best first.
    ///
    /// The word is normalized with the index tokenizer; words already in the
    /// vocabulary yield no suggestions.
    pub fn suggest(&self, word: &str, limit: usize) -> Vec<String> {
        let Some(term) = self.tokenizer.terms(word).next() else {
            return vec![];
        };
        if self.terms.contains_key(&term) {
            return vec![];
        }

        let mut candidates: Vec<(f64, &str)> = self
            .vocabulary()
            .map(|candidate| {
                (
                    jaro_winkler::similarity(term.chars(), candidate.chars()),
                    candidate,
                )
            })
            .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
            .collect();
        candidates.sort_by(|(a, x), (b, y)| b.total_cmp(a).then_with(|| x.cmp(y)));

        candidates
            .into_iter()
            .take(limit)
            .map(|(_, candidate)| candidate.to_string())
            .collect()
    }

    /// Reassembles an index from decoded parts, checking every structural invariant.
    pub(crate) fn from_parts(parts: IndexParts) -> Result<Self, SearchError> {
        let IndexParts {
            tokenizer,
            scoring,
            fragments,
            lengths,
            terms,
        } = parts;

        if fragments.is_empty() {
            return Err(SearchError::corrupt("index contains no fragments"));
        }
        if lengths.len() != fragments.len() {
            return Err(SearchError::corrupt(format!(
                "{} field-length records for {} fragments",
                lengths.len(),
                fragments.len()
            )));
        }
        scoring
            .validate()
            .map_err(|e| SearchError::corrupt(format!("stored scoring policy: {e}")))?;

        let fragment_count = fragments.len();
        for (term, postings) in &terms {
            if term.is_empty() {
                return Err(SearchError::corrupt("empty term in vocabulary"));
            }
            if postings.is_empty() {
                return Err(SearchError::corrupt(format!("term '{term}' has no postings")));
            }
            let ordered = postings
                .windows(2)
                .all(|pair| pair[0].fragment < pair[1].fragment);
            let in_range = postings
                .iter()
                .all(|posting| (posting.fragment as usize) < fragment_count);
            if !ordered || !in_range {
                return Err(SearchError::corrupt(format!(
                    "postings for '{term}' are unsorted or reference unknown fragments"
                )));
            }
            if !postings.iter().all(Posting::is_consistent) {
                return Err(SearchError::corrupt(format!(
                    "postings for '{term}' have inconsistent frequencies"
                )));
            }
            for posting in postings {
                let id = posting.fragment as usize;
                posting.check_spans(&fragments[id], lengths[id]).map_err(|reason| {
                    SearchError::corrupt(format!(
                        "posting for '{term}' in fragment {id}: {reason}"
                    ))
                })?;
            }
        }

        Ok(Self::new(
            fragments,
            terms,
            lengths,
            Tokenizer::new(tokenizer),
            scoring,
        ))
    }

    pub(crate) fn as_parts(&self) -> IndexPartsRef<'_> {
        IndexPartsRef {
            tokenizer: self.tokenizer.config(),
            scoring: &self.scoring,
            fragments: &self.fragments,
            lengths: &self.lengths,
            terms: &self.terms,
        }
    }
}

/// Borrowed serialization view of an index. Field order must match [`IndexParts`].
#[derive(Serialize)]
pub(crate) struct IndexPartsRef<'a> {
    pub(crate) tokenizer: &'a TokenizerConfig,
    pub(crate) scoring: &'a ScoringConfig,
    pub(crate) fragments: &'a [Fragment],
    pub(crate) lengths: &'a [FieldLengths],
    pub(crate) terms: &'a BTreeMap<String, Vec<Posting>>,
}

/// Owned deserialization target for an index.
#[derive(Deserialize)]
pub(crate) struct IndexParts {
    tokenizer: TokenizerConfig,
    scoring: ScoringConfig,
    fragments: Vec<Fragment>,
    lengths: Vec<FieldLengths>,
    terms: BTreeMap<String, Vec<Posting>>,
}
