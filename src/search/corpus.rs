//! Fragment ingestion: payload parsing, record validation and id assignment.

use crate::error::SearchError;
use crate::types::{Field, Fragment, FragmentId};
use ahash::AHashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Matches a JavaScript assignment wrapper such as `var documenterSearchIndex = `.
static JS_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:var|let|const)\s+)?[A-Za-z_$][\w$.]*\s*=\s*")
        .expect("assignment pattern is valid")
});

/// Largest field, in bytes, whose token spans fit in 32-bit offsets.
const MAX_FIELD_BYTES: usize = u32::MAX as usize;

/// How repeated locations are handled during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Any repeated location fails with `DuplicateLocation`.
    #[default]
    Reject,
    /// Fragments repeating a location with the same page, title and category are
    /// folded into the first occurrence; their texts are joined with a blank line.
    Merge,
}

/// A validated, ordered fragment collection. Fragment ids are positions in this collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    fragments: Vec<Fragment>,
}

impl Corpus {
    /// Validates fragments, rejecting empty or repeated locations.
    pub fn new(fragments: Vec<Fragment>) -> Result<Self, SearchError> {
        Self::with_policy(fragments, DuplicatePolicy::Reject)
    }

    pub fn with_policy(
        fragments: Vec<Fragment>,
        policy: DuplicatePolicy,
    ) -> Result<Self, SearchError> {
        let mut accepted: Vec<Fragment> = Vec::with_capacity(fragments.len());
        // location -> (index in `accepted`, input position)
        let mut seen: AHashMap<String, (usize, usize)> = AHashMap::with_capacity(fragments.len());

        for (position, fragment) in fragments.into_iter().enumerate() {
            if fragment.location.trim().is_empty() {
                return Err(SearchError::InvalidFragment {
                    position,
                    reason: "location must not be empty".to_string(),
                });
            }

            if let Some(&(slot, first)) = seen.get(&fragment.location) {
                let existing = &mut accepted[slot];
                let mergeable = policy == DuplicatePolicy::Merge
                    && existing.page == fragment.page
                    && existing.title == fragment.title
                    && existing.category == fragment.category;
                if !mergeable {
                    return Err(SearchError::DuplicateLocation {
                        location: fragment.location,
                        first,
                        second: position,
                    });
                }
                if !fragment.text.is_empty() {
                    if !existing.text.is_empty() {
                        existing.text.push_str("\n\n");
                    }
                    existing.text.push_str(&fragment.text);
                }
                check_field_sizes(existing, position, MAX_FIELD_BYTES)?;
                continue;
            }

            check_field_sizes(&fragment, position, MAX_FIELD_BYTES)?;
            seen.insert(fragment.location.clone(), (accepted.len(), position));
            accepted.push(fragment);
        }

        if accepted.len() > FragmentId::MAX as usize {
            return Err(SearchError::InvalidFragment {
                position: FragmentId::MAX as usize,
                reason: "too many fragments for 32-bit fragment ids".to_string(),
            });
        }

        Ok(Self {
            fragments: accepted,
        })
    }

    /// Parses a documentation search payload and validates it.
    ///
    /// Accepted shapes:
    /// - a JSON array of fragment records
    /// - a JSON object with a `docs` array
    /// - either of the above behind a JavaScript assignment
    ///   (`var documenterSearchIndex = {"docs": [...]}`), optionally followed by `;`
    pub fn from_payload(payload: &str, policy: DuplicatePolicy) -> Result<Self, SearchError> {
        let fragments = parse_payload(payload)?;
        tracing::debug!("Parsed {} fragment records from payload", fragments.len());
        Self::with_policy(fragments, policy)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.get(id as usize)
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Iterates `(id, fragment)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (FragmentId, &Fragment)> {
        self.fragments
            .iter()
            .enumerate()
            .map(|(id, fragment)| (id as FragmentId, fragment))
    }

    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }
}

#[derive(Deserialize)]
struct Wrapped {
    docs: Vec<Fragment>,
}

fn parse_payload(payload: &str) -> Result<Vec<Fragment>, SearchError> {
    let body = JS_ASSIGNMENT
        .find(payload)
        .map_or(payload, |assignment| &payload[assignment.end()..]);
    let body = body.trim().trim_end_matches(';');

    // Parse the shape first so field errors report against the right structure.
    let value: serde_json::Value = serde_json::from_str(body)?;
    if value.is_array() {
        return Ok(serde_json::from_value(value)?);
    }
    if value.get("docs").is_some() {
        let wrapped: Wrapped = serde_json::from_value(value)?;
        return Ok(wrapped.docs);
    }
    Err(SearchError::MalformedPayload(
        "expected an array of fragments or an object with a `docs` array".to_string(),
    ))
}

/// Rejects fragments with a field longer than `max_bytes`.
fn check_field_sizes(
    fragment: &Fragment,
    position: usize,
    max_bytes: usize,
) -> Result<(), SearchError> {
    match Field::ALL
        .into_iter()
        .find(|&field| fragment.field(field).len() > max_bytes)
    {
        Some(field) => Err(SearchError::InvalidFragment {
            position,
            reason: format!(
                "{} field is {} bytes, limit is {}",
                field.name(),
                fragment.field(field).len(),
                max_bytes
            ),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use assert2::check;
    use rstest::rstest;

    fn fragment(location: &str, title: &str, text: &str) -> Fragment {
        Fragment::new(location, "Page", title, text, Category::Page)
    }

    #[test]
    fn test_assigns_ids_in_input_order() {
        let corpus = Corpus::new(vec![
            fragment("b", "B", ""),
            fragment("a", "A", ""),
            fragment("c", "C", ""),
        ])
        .unwrap();
        let locations: Vec<_> = corpus.iter().map(|(id, f)| (id, f.location.as_str())).collect();
        check!(locations == [(0, "b"), (1, "a"), (2, "c")]);
    }

    #[test]
    fn test_rejects_duplicate_location() {
        let result = Corpus::new(vec![
            fragment("a", "One", ""),
            fragment("b", "Two", ""),
            fragment("a", "Three", ""),
        ]);
        check!(let Err(SearchError::DuplicateLocation { first: 0, second: 2, .. }) = result);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_rejects_empty_location(#[case] location: &str) {
        let result = Corpus::new(vec![fragment("a", "", ""), fragment(location, "", "")]);
        check!(let Err(SearchError::InvalidFragment { position: 1, .. }) = result);
    }

    #[test]
    fn test_merge_policy_joins_paragraphs() {
        let corpus = Corpus::with_policy(
            vec![
                fragment("tutorial/", "Tutorial", "First paragraph."),
                fragment("tutorial/#Setup", "Setup", ""),
                fragment("tutorial/", "Tutorial", "Second paragraph."),
            ],
            DuplicatePolicy::Merge,
        )
        .unwrap();
        check!(corpus.len() == 2);
        check!(corpus.get(0).unwrap().text == "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_field_size_limit() {
        let fragment = fragment("a", "Title", "twelve bytes");
        check!(check_field_sizes(&fragment, 3, 12).is_ok());
        let result = check_field_sizes(&fragment, 3, 11);
        check!(let Err(SearchError::InvalidFragment { position: 3, .. }) = &result);
        check!(result.unwrap_err().to_string().contains("text field is 12 bytes"));
    }

    #[test]
    fn test_merge_policy_still_rejects_conflicting_records() {
        let result = Corpus::with_policy(
            vec![fragment("a", "Intro", ""), fragment("a", "Other", "")],
            DuplicatePolicy::Merge,
        );
        check!(let Err(SearchError::DuplicateLocation { .. }) = result);
    }

    #[rstest]
    #[case(r#"[{"location":"a","page":"P","title":"T","text":"x","category":"page"}]"#)]
    #[case(r#"{"docs":[{"location":"a","page":"P","title":"T","text":"x","category":"page"}]}"#)]
    #[case("var documenterSearchIndex = {\"docs\":\n[{\"location\":\"a\",\"page\":\"P\",\"title\":\"T\",\"text\":\"x\",\"category\":\"page\"}]\n}\n")]
    #[case(r#"window.searchIndex = [{"location":"a","page":"P"}];"#)]
    fn test_payload_shapes(#[case] payload: &str) {
        let corpus = Corpus::from_payload(payload, DuplicatePolicy::Reject).unwrap();
        check!(corpus.len() == 1);
        check!(corpus.get(0).unwrap().location == "a");
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"items": []}"#)]
    #[case(r#"[{"page":"P"}]"#)]
    fn test_malformed_payload(#[case] payload: &str) {
        let result = Corpus::from_payload(payload, DuplicatePolicy::Reject);
        check!(let Err(SearchError::MalformedPayload(_)) = result);
    }
}
