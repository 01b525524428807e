//! Text tokenization and normalization for indexing and querying.
//!
//! A single [`Tokenizer`] value is stored inside every built index and the
//! query path only ever tokenizes through it, so indexed terms and query
//! terms cannot be produced by two different policies.

use ahash::AHashSet;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt, iter::Peekable, str::CharIndices, sync::Arc};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Default minimum token length. Set to 1 so short technical terms like `u8`, `io` or `x` survive.
const DEFAULT_MIN_TOKEN_LENGTH: usize = 1;

/// Tokenizer policy. Persisted with the index it built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizerConfig {
    /// Tokens with fewer characters than this are dropped.
    pub min_token_len: usize,
    /// Lower-case words dropped after case folding. Empty by default: documentation
    /// search should not silently discard technical terms.
    pub stop_words: Vec<String>,
    /// Post-folding normalization applied to every surviving token.
    pub normalization: Normalization,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_len: DEFAULT_MIN_TOKEN_LENGTH,
            stop_words: Vec::new(),
            normalization: Normalization::None,
        }
    }
}

/// Built-in normalizers selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    None,
    /// English Snowball stemming ("parsing" → "pars").
    Stem,
    /// Strip diacritics ("café" → "cafe").
    FoldDiacritics,
    /// Fold diacritics, then stem.
    StemAndFold,
}

impl Normalization {
    fn normalizer(self) -> Arc<dyn Normalizer> {
        match self {
            Self::None => Arc::new(Identity),
            Self::Stem => Arc::new(EnglishStemmer::default()),
            Self::FoldDiacritics => Arc::new(DiacriticFolder),
            Self::StemAndFold => Arc::new(Chain(vec![
                Box::new(DiacriticFolder),
                Box::new(EnglishStemmer::default()),
            ])),
        }
    }
}

/// Hook applied to each case-folded token. Returning an empty string drops the token.
///
/// Normalizers are selected through [`Normalization`] so the stored tokenizer
/// config always names the policy an index was built with; a new normalizer
/// means a new variant there.
pub(crate) trait Normalizer: Send + Sync {
    fn normalize<'a>(&self, term: Cow<'a, str>) -> Cow<'a, str>;
}

struct Identity;

impl Normalizer for Identity {
    fn normalize<'a>(&self, term: Cow<'a, str>) -> Cow<'a, str> {
        term
    }
}

struct EnglishStemmer(Stemmer);

impl Default for EnglishStemmer {
    fn default() -> Self {
        Self(Stemmer::create(Algorithm::English))
    }
}

impl Normalizer for EnglishStemmer {
    fn normalize<'a>(&self, term: Cow<'a, str>) -> Cow<'a, str> {
        Cow::Owned(self.0.stem(&term).into_owned())
    }
}

struct DiacriticFolder;

impl Normalizer for DiacriticFolder {
    fn normalize<'a>(&self, term: Cow<'a, str>) -> Cow<'a, str> {
        if term.is_ascii() {
            return term;
        }
        Cow::Owned(term.nfd().filter(|c| !is_combining_mark(*c)).collect())
    }
}

struct Chain(Vec<Box<dyn Normalizer>>);

impl Normalizer for Chain {
    fn normalize<'a>(&self, term: Cow<'a, str>) -> Cow<'a, str> {
        self.0
            .iter()
            .fold(term, |term, normalizer| normalizer.normalize(term))
    }
}

/// One normalized token with its position among emitted tokens and its byte span
/// in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub position: u32,
    pub start: usize,
    pub end: usize,
}

/// Splits text on non-alphanumeric boundaries and normalizes the pieces.
#[derive(Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    stop_words: AHashSet<String>,
    normalizer: Arc<dyn Normalizer>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl PartialEq for Tokenizer {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let stop_words = config
            .stop_words
            .iter()
            .map(|word| word.to_lowercase())
            .collect();
        let normalizer = config.normalization.normalizer();
        Self {
            config,
            stop_words,
            normalizer,
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Returns a lazy token stream over `text`. The stream is `Clone`, and calling
    /// this again restarts from the beginning.
    pub fn tokens<'t, 's>(&'t self, text: &'s str) -> Tokens<'t, 's> {
        Tokens {
            tokenizer: self,
            text,
            chars: text.char_indices().peekable(),
            position: 0,
        }
    }

    /// Convenience wrapper yielding only the terms.
    pub fn terms<'t, 's>(&'t self, text: &'s str) -> impl Iterator<Item = String> {
        self.tokens(text).map(|token| token.term)
    }

    /// Case-folds, filters and normalizes one raw word.
    fn normalize_word(&self, word: &str, char_count: usize) -> Option<String> {
        if char_count < self.config.min_token_len {
            return None;
        }
        let lowercase = word.to_lowercase();
        if self.stop_words.contains(&lowercase) {
            return None;
        }
        let normalized = self.normalizer.normalize(Cow::Owned(lowercase));
        (!normalized.is_empty()).then(|| normalized.into_owned())
    }
}

/// Lazy token stream produced by [`Tokenizer::tokens`].
#[derive(Clone)]
pub struct Tokens<'t, 's> {
    tokenizer: &'t Tokenizer,
    text: &'s str,
    chars: Peekable<CharIndices<'s>>,
    position: u32,
}

impl Iterator for Tokens<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let (start, first) = self.chars.find(|(_, c)| c.is_alphanumeric())?;
            let mut end = start + first.len_utf8();
            let mut char_count = 1;
            while let Some((i, c)) = self.chars.next_if(|(_, c)| c.is_alphanumeric()) {
                end = i + c.len_utf8();
                char_count += 1;
            }

            if let Some(term) = self
                .tokenizer
                .normalize_word(&self.text[start..end], char_count)
            {
                let position = self.position;
                self.position += 1;
                return Some(Token {
                    term,
                    position,
                    start,
                    end,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn terms(tokenizer: &Tokenizer, text: &str) -> Vec<String> {
        tokenizer.terms(text).collect()
    }

    #[rstest]
    #[case("Particle Potential", &["particle", "potential"])]
    #[case("snake_case hyphen-case", &["snake", "case", "hyphen", "case"])]
    #[case("ClimaLSM.jl, v0.2!", &["climalsm", "jl", "v0", "2"])]
    #[case("u8 i32 io", &["u8", "i32", "io"])]
    #[case("a <: b", &["a", "b"])]
    fn test_default_policy(#[case] input: &str, #[case] expected: &[&str]) {
        let tokenizer = Tokenizer::default();
        check!(terms(&tokenizer, input) == expected);
    }

    #[test]
    fn test_positions_and_spans() {
        let tokenizer = Tokenizer::default();
        let tokens: Vec<_> = tokenizer.tokens("  Soil, snow & carbon").collect();
        check!(tokens.len() == 3);
        check!(tokens[0].position == 0);
        check!(tokens[2].position == 2);
        check!(&"  Soil, snow & carbon"[tokens[1].start..tokens[1].end] == "snow");
    }

    #[test]
    fn test_positions_skip_dropped_tokens() {
        let tokenizer = Tokenizer::new(TokenizerConfig {
            stop_words: vec!["The".to_string()],
            ..TokenizerConfig::default()
        });
        let tokens: Vec<_> = tokenizer.tokens("the model the land").collect();
        check!(tokens.iter().map(|t| t.term.as_str()).collect::<Vec<_>>() == ["model", "land"]);
        check!(tokens[1].position == 1);
    }

    #[test]
    fn test_min_token_length() {
        let tokenizer = Tokenizer::new(TokenizerConfig {
            min_token_len: 3,
            ..TokenizerConfig::default()
        });
        check!(terms(&tokenizer, "an ode to odes") == ["ode", "odes"]);
    }

    #[rstest]
    #[case(Normalization::Stem, "running models", &["run", "model"])]
    #[case(Normalization::FoldDiacritics, "Café naïve", &["cafe", "naive"])]
    #[case(Normalization::StemAndFold, "Cafés", &["cafe"])]
    fn test_normalization(
        #[case] normalization: Normalization,
        #[case] input: &str,
        #[case] expected: &[&str],
    ) {
        let tokenizer = Tokenizer::new(TokenizerConfig {
            normalization,
            ..TokenizerConfig::default()
        });
        check!(terms(&tokenizer, input) == expected);
    }

    #[test]
    fn test_stream_is_restartable() {
        let tokenizer = Tokenizer::default();
        let mut stream = tokenizer.tokens("one two three");
        stream.next();
        let resumed: Vec<_> = stream.clone().map(|t| t.term).collect();
        check!(resumed == ["two", "three"]);
        check!(stream.count() == 2);
        check!(tokenizer.tokens("one two three").count() == 3);
    }

    #[rstest]
    #[case("Москва", &["москва"])]
    #[case("日本", &["日本"])]
    #[case("🦀", &[])]
    fn test_unicode_handling(#[case] input: &str, #[case] expected: &[&str]) {
        let tokenizer = Tokenizer::default();
        check!(terms(&tokenizer, input) == expected);
    }

    #[test]
    fn test_empty_and_whitespace() {
        let tokenizer = Tokenizer::default();
        check!(terms(&tokenizer, "").is_empty());
        check!(terms(&tokenizer, "   ").is_empty());
        check!(terms(&tokenizer, "\n\t-- ::").is_empty());
    }
}
