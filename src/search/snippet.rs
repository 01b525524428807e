//! Body-text excerpts for search results.

use ahash::AHashSet;

const ELLIPSIS: char = '…';

/// A matched token in the body text: byte span plus the index of the query term it matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) term: usize,
}

/// Cuts a window of at most `width` characters out of `text`.
///
/// The window covers the run of matches with the most distinct terms, is widened
/// evenly around it and snapped to word boundaries. Without matches the head of the
/// text is used. Whitespace is collapsed and cut ends are marked with `…`.
pub(crate) fn excerpt(text: &str, mut matches: Vec<Match>, width: usize) -> String {
    // Byte offset of every char, plus the end of the text.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = offsets.len() - 1;
    if total <= width {
        return collapse_whitespace(text);
    }
    if width == 0 {
        return String::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let char_at = |byte: usize| offsets.partition_point(|&b| b < byte);

    matches.retain(|m| m.start < m.end && m.end <= text.len());
    matches.sort_by_key(|m| (m.start, m.end));

    let (start, end) = match best_span(&matches, width, char_at) {
        Some((first, last)) => {
            let slack = width.saturating_sub(last - first);
            let mut end = (first.saturating_sub(slack / 2) + width).min(total);
            let mut start = end.saturating_sub(width);
            while start > 0 && start < first && is_word(&chars, start - 1) && is_word(&chars, start) {
                start += 1;
            }
            while end < total && end > last && is_word(&chars, end - 1) && is_word(&chars, end) {
                end -= 1;
            }
            (start, end)
        }
        None => {
            let mut end = width;
            while end > 0 && is_word(&chars, end - 1) && is_word(&chars, end) {
                end -= 1;
            }
            (0, if end == 0 { width } else { end })
        }
    };

    let mut snippet = String::new();
    if start > 0 {
        snippet.push(ELLIPSIS);
    }
    snippet.push_str(&collapse_whitespace(&text[offsets[start]..offsets[end]]));
    if end < total {
        snippet.push(ELLIPSIS);
    }
    snippet
}

/// Char range of the match run with the most distinct terms that fits in `width`.
fn best_span(
    matches: &[Match],
    width: usize,
    char_at: impl Fn(usize) -> usize,
) -> Option<(usize, usize)> {
    let spans: Vec<(usize, usize)> = matches
        .iter()
        .map(|m| (char_at(m.start), char_at(m.end)))
        .collect();

    let mut best: Option<(usize, (usize, usize))> = None;
    for (i, &(first, first_end)) in spans.iter().enumerate() {
        let mut terms = AHashSet::new();
        let mut last = first_end;
        for (m, &(_, end)) in matches[i..].iter().zip(&spans[i..]) {
            if end.saturating_sub(first) > width && !terms.is_empty() {
                break;
            }
            terms.insert(m.term);
            last = last.max(end);
        }
        if best.is_none_or(|(count, _)| terms.len() > count) {
            best = Some((terms.len(), (first, last)));
        }
    }
    best.map(|(_, span)| span)
}

fn is_word(chars: &[char], index: usize) -> bool {
    chars.get(index).is_some_and(|c| c.is_alphanumeric())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    fn find(text: &str, word: &str, term: usize) -> Match {
        let start = text.find(word).unwrap();
        Match {
            start,
            end: start + word.len(),
            term,
        }
    }

    #[test]
    fn test_short_text_returned_whole() {
        check!(excerpt("potential  energy\n chaos", vec![], 160) == "potential energy chaos");
    }

    #[test]
    fn test_head_fallback_without_matches() {
        let text = "alpha beta gamma delta epsilon";
        check!(excerpt(text, vec![], 13) == "alpha beta…");
    }

    #[test]
    fn test_window_centers_on_match() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let snippet = excerpt(text, vec![find(text, "seven", 0)], 20);
        check!(snippet.starts_with('…'));
        check!(snippet.ends_with('…'));
        check!(snippet.contains("seven"));
        check!(snippet.chars().count() <= 22);
    }

    #[test]
    fn test_prefers_window_with_more_distinct_terms() {
        let text = "soil appears here alone and then much later soil carbon flux appear together at the end";
        let matches = vec![
            find(text, "soil", 0),
            Match {
                start: text.rfind("soil").unwrap(),
                end: text.rfind("soil").unwrap() + 4,
                term: 0,
            },
            find(text, "carbon", 1),
            find(text, "flux", 2),
        ];
        let snippet = excerpt(text, matches, 30);
        check!(snippet.contains("soil carbon flux"));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "über café naïve résumé façade jalapeño piñata crème brûlée";
        let snippet = excerpt(text, vec![find(text, "jalapeño", 0)], 16);
        check!(snippet.contains("jalapeño"));
    }
}
