//! Query evaluation: parsing free text, OR-ranking with tf-idf, phrase filters.

use super::index::{InvertedIndex, Posting};
use super::snippet;
use crate::error::SearchError;
use crate::types::{Field, FragmentId, SearchResult};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Query-time limits. Not persisted with the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Result count used when the caller does not pass one.
    pub default_limit: usize,
    /// Hard cap on any requested result count.
    pub max_limit: usize,
    /// Longest accepted query, in characters.
    pub max_query_chars: usize,
    /// Snippet width, in characters.
    pub snippet_chars: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 500,
            max_query_chars: 1024,
            snippet_chars: 160,
        }
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(SearchError::InvalidConfig(
                "query limits must be at least 1".to_string(),
            ));
        }
        if self.max_query_chars == 0 {
            return Err(SearchError::InvalidConfig(
                "max_query_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves an optional caller limit against the default and the cap.
    pub fn resolve_limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

/// A ranked reference to a fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub fragment: FragmentId,
    pub score: f32,
}

/// A tokenized query: distinct terms in first-seen order plus quoted phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub terms: Vec<String>,
    /// Multi-term phrases that must occur at consecutive positions of one field.
    pub phrases: Vec<Vec<String>>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl InvertedIndex {
    /// Tokenizes query text with this index's tokenizer.
    ///
    /// Text between double quotes forms a phrase; an unterminated quote runs to the end.
    pub fn parse_query(&self, query: &str, config: &QueryConfig) -> Result<ParsedQuery, SearchError> {
        let len = query.chars().count();
        if len > config.max_query_chars {
            return Err(SearchError::QueryTooLong {
                len,
                max: config.max_query_chars,
            });
        }

        let mut parsed = ParsedQuery::default();
        let mut seen = AHashSet::new();
        for (i, segment) in query.split('"').enumerate() {
            let terms: Vec<String> = self.tokenizer().terms(segment).collect();
            for term in &terms {
                if seen.insert(term.clone()) {
                    parsed.terms.push(term.clone());
                }
            }
            let quoted = i % 2 == 1;
            if quoted && terms.len() > 1 {
                parsed.phrases.push(terms);
            }
        }
        Ok(parsed)
    }

    /// Ranks fragments for `query` under the default query limits.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Hit>, SearchError> {
        self.search_with(query, limit, &QueryConfig::default())
    }

    pub fn search_with(
        &self,
        query: &str,
        limit: Option<usize>,
        config: &QueryConfig,
    ) -> Result<Vec<Hit>, SearchError> {
        let parsed = self.parse_query(query, config)?;
        Ok(self.rank(&parsed, config.resolve_limit(limit)))
    }

    /// Ranks fragments and renders result records with snippets.
    pub fn search_results(
        &self,
        query: &str,
        limit: Option<usize>,
        config: &QueryConfig,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let start = Instant::now();
        let parsed = self.parse_query(query, config)?;
        let hits = self.rank(&parsed, config.resolve_limit(limit));
        let results: Vec<SearchResult> = hits
            .iter()
            .filter_map(|hit| self.result(hit, &parsed, config.snippet_chars))
            .collect();
        tracing::debug!(
            "Query '{}' ({} terms, {} phrases) returned {} results in {:?}",
            query,
            parsed.terms.len(),
            parsed.phrases.len(),
            results.len(),
            start.elapsed()
        );
        Ok(results)
    }

    /// Scores every fragment matching at least one query term.
    ///
    /// Ties keep insertion order, so identical input always yields identical output.
    pub fn rank(&self, parsed: &ParsedQuery, limit: usize) -> Vec<Hit> {
        if parsed.is_empty() || limit == 0 {
            return vec![];
        }

        let scoring = self.scoring();
        let mut scores: AHashMap<FragmentId, f32> = AHashMap::new();
        for term in &parsed.terms {
            let Some(postings) = self.postings(term) else {
                continue;
            };
            let idf = self.idf(term);
            for posting in postings {
                *scores.entry(posting.fragment).or_insert(0.0) += posting.weighted_tf(scoring) * idf;
            }
        }

        for phrase in &parsed.phrases {
            let matching = self.phrase_matches(phrase);
            scores.retain(|fragment, _| matching.binary_search(fragment).is_ok());
        }

        let mut hits: Vec<Hit> = scores
            .into_iter()
            .filter_map(|(fragment, score)| {
                let category = &self.fragment(fragment)?.category;
                Some(Hit {
                    fragment,
                    score: score * scoring.category_weight(category),
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.fragment.cmp(&b.fragment))
        });
        hits.truncate(limit);
        hits
    }

    /// Fragments, sorted by id, where `phrase` occurs at consecutive positions in one field.
    pub fn phrase_matches(&self, phrase: &[String]) -> Vec<FragmentId> {
        let mut lists: Vec<&[Posting]> = Vec::with_capacity(phrase.len());
        for term in phrase {
            match self.postings(term) {
                Some(postings) => lists.push(postings),
                None => return vec![],
            }
        }
        let Some((first, rest)) = lists.split_first() else {
            return vec![];
        };

        // Sorted-merge intersection: advance a cursor per list in lockstep with `first`.
        let mut cursors = vec![0usize; rest.len()];
        let mut matches = Vec::new();
        'candidates: for anchor in *first {
            let mut aligned: Vec<&Posting> = Vec::with_capacity(rest.len());
            for (list, cursor) in rest.iter().zip(cursors.iter_mut()) {
                while *cursor < list.len() && list[*cursor].fragment < anchor.fragment {
                    *cursor += 1;
                }
                match list.get(*cursor) {
                    Some(posting) if posting.fragment == anchor.fragment => aligned.push(posting),
                    Some(_) => continue 'candidates,
                    None => break 'candidates,
                }
            }

            let adjacent = anchor.occurrences().iter().any(|start| {
                aligned.iter().zip(1u32..).all(|(posting, offset)| {
                    start
                        .position
                        .checked_add(offset)
                        .is_some_and(|position| posting.has_position(start.field, position))
                })
            });
            if adjacent {
                matches.push(anchor.fragment);
            }
        }
        matches
    }

    fn result(&self, hit: &Hit, parsed: &ParsedQuery, width: usize) -> Option<SearchResult> {
        let fragment = self.fragment(hit.fragment)?;
        let matches: Vec<snippet::Match> = parsed
            .terms
            .iter()
            .enumerate()
            .filter_map(|(term, text)| Some((term, self.posting(text, hit.fragment)?)))
            .flat_map(|(term, posting)| {
                posting.occurrences_in(Field::Text).map(move |o| snippet::Match {
                    start: o.start as usize,
                    end: o.end as usize,
                    term,
                })
            })
            .collect();

        Some(SearchResult {
            id: hit.fragment,
            location: fragment.location.clone(),
            page: fragment.page.clone(),
            title: fragment.title.clone(),
            category: fragment.category.clone(),
            snippet: snippet::excerpt(&fragment.text, matches, width),
            score: hit.score,
        })
    }
}
