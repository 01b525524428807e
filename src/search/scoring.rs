//! Relevance weighting for tf-idf ranking.
//!
//! A fragment's score for a query is
//! `category_weight * Σ_terms Σ_fields tf(term, field) * field_weight(field) * idf(term)`
//! with `idf(term) = ln(1 + N / df(term))`. Every factor is non-negative, so a
//! fragment that matches more query terms never scores lower.

use crate::error::SearchError;
use crate::types::{Category, Field};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-field multipliers. Structural headings outrank body text by default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldWeights {
    pub title: f32,
    pub page: f32,
    pub text: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 3.0,
            page: 2.0,
            text: 1.0,
        }
    }
}

impl FieldWeights {
    pub const fn get(&self, field: Field) -> f32 {
        match field {
            Field::Title => self.title,
            Field::Page => self.page,
            Field::Text => self.text,
        }
    }
}

/// Scoring policy. Persisted with the index so a decoded index ranks exactly
/// like the one that was encoded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub fields: FieldWeights,
    /// Multiplier per category name (`page`, `section`, ...). Missing categories weigh 1.0.
    pub categories: BTreeMap<String, f32>,
}

impl ScoringConfig {
    pub fn field_weight(&self, field: Field) -> f32 {
        self.fields.get(field)
    }

    pub fn category_weight(&self, category: &Category) -> f32 {
        self.categories
            .get(category.as_str())
            .copied()
            .unwrap_or(1.0)
    }

    /// Rejects weights that would break score monotonicity.
    pub fn validate(&self) -> Result<(), SearchError> {
        for field in Field::ALL {
            let weight = self.field_weight(field);
            if !weight.is_finite() || weight < 0.0 {
                return Err(SearchError::InvalidConfig(format!(
                    "field weight for '{}' must be a finite non-negative number, got {}",
                    field.name(),
                    weight
                )));
            }
        }
        for (category, &weight) in &self.categories {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(SearchError::InvalidConfig(format!(
                    "category weight for '{}' must be a finite positive number, got {}",
                    category, weight
                )));
            }
        }
        Ok(())
    }
}

/// Inverse document frequency: `ln(1 + N / df)`. Always positive for `df >= 1`.
pub(crate) fn idf(total_fragments: usize, doc_freq: usize) -> f32 {
    if doc_freq == 0 {
        return 0.0;
    }
    (1.0 + total_fragments as f32 / doc_freq as f32).ln()
}
