//! Plain-text rendering of search results and index statistics for the CLI.

use crate::search::{IndexStats, InvertedIndex, QueryConfig};
use crate::types::SearchResult;

/// Maximum "did you mean" suggestions per unmatched query word.
const SUGGESTIONS_PER_WORD: usize = 3;

/// Format ranked results with relevance relative to the top hit.
pub fn format_search_results(results: &[SearchResult], query: &str) -> String {
    let mut output = format!("Search results for '{}':\n\n", query);

    let max_score = results.first().map_or(1.0, |r| r.score);

    for (idx, result) in results.iter().enumerate() {
        let relevance = if max_score > 0.0 {
            ((result.score / max_score) * 100.0).round() as u8
        } else {
            0
        };

        let heading = if result.title.is_empty() || result.title == result.page {
            result.page.clone()
        } else {
            format!("{} › {}", result.page, result.title)
        };
        output.push_str(&format!(
            "{}. {} ({}) - relevance: {}%\n",
            idx + 1,
            heading,
            result.category,
            relevance
        ));
        output.push_str(&format!("   {}\n", result.location));
        if !result.snippet.is_empty() {
            output.push_str(&format!("   {}\n", result.snippet));
        }
        output.push('\n');
    }

    output
}

/// Message for an empty result, with spelling suggestions drawn from the index vocabulary.
pub fn format_no_results(index: &InvertedIndex, query: &str, config: &QueryConfig) -> String {
    let mut output = format!("No results found for '{}'.", query);

    let mut suggestions: Vec<String> = Vec::new();
    if let Ok(parsed) = index.parse_query(query, config) {
        for term in &parsed.terms {
            for suggestion in index.suggest(term, SUGGESTIONS_PER_WORD) {
                if !suggestions.contains(&suggestion) {
                    suggestions.push(suggestion);
                }
            }
        }
    }

    if !suggestions.is_empty() {
        output.push_str("\n\nDid you mean: ");
        output.push_str(&suggestions.join(", "));
        output.push('?');
    }
    output.push('\n');
    output
}

/// Summary block for `inspect`.
pub fn format_stats(index: &InvertedIndex, stats: &IndexStats) -> String {
    let tokenizer = index.tokenizer().config();
    let scoring = index.scoring();

    let mut output = String::new();
    output.push_str(&format!("Fragments:   {}\n", stats.fragments));
    output.push_str(&format!("Terms:       {}\n", stats.terms));
    output.push_str(&format!("Postings:    {}\n", stats.postings));
    output.push_str(&format!("Occurrences: {}\n", stats.occurrences));
    output.push_str(&format!(
        "Avg tokens:  title {:.1}, page {:.1}, text {:.1}\n",
        stats.avg_title_len, stats.avg_page_len, stats.avg_text_len
    ));
    output.push_str(&format!(
        "Tokenizer:   min length {}, {} stop words, normalization {:?}\n",
        tokenizer.min_token_len,
        tokenizer.stop_words.len(),
        tokenizer.normalization
    ));
    output.push_str(&format!(
        "Weights:     title {}, page {}, text {}\n",
        scoring.fields.title, scoring.fields.page, scoring.fields.text
    ));
    for (category, weight) in &scoring.categories {
        output.push_str(&format!("Category:    {} x{}\n", category, weight));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::IndexBuilder;
    use crate::types::{Category, Fragment};
    use assert2::check;

    fn index() -> InvertedIndex {
        IndexBuilder::default()
            .build_fragments(vec![
                Fragment::new("a", "Dynamics", "Intro", "particle potential", Category::Section),
                Fragment::new("b", "Dynamics", "Dynamics", "potential energy chaos", Category::Page),
            ])
            .unwrap()
    }

    #[test]
    fn test_format_results() {
        let index = index();
        let results = index
            .search_results("potential chaos", None, &QueryConfig::default())
            .unwrap();
        let output = format_search_results(&results, "potential chaos");
        check!(output.starts_with("Search results for 'potential chaos':"));
        check!(output.contains("1. Dynamics (page) - relevance: 100%"));
        check!(output.contains("2. Dynamics › Intro (section)"));
        check!(output.contains("   potential energy chaos"));
    }

    #[test]
    fn test_format_no_results_suggests() {
        let output = format_no_results(&index(), "potentail", &QueryConfig::default());
        check!(output.contains("No results found for 'potentail'."));
        check!(output.contains("Did you mean: potential?"));
    }

    #[test]
    fn test_format_stats() {
        let index = index();
        let output = format_stats(&index, &index.stats());
        check!(output.contains("Fragments:   2"));
        check!(output.contains("normalization None"));
    }
}
