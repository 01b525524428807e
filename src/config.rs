//! TOML configuration for building and querying indexes.
//!
//! ```toml
//! [tokenizer]
//! min_token_len = 2
//! stop_words = ["the", "a"]
//! normalization = "stem"
//!
//! [scoring.fields]
//! title = 3.0
//!
//! [scoring.categories]
//! section = 1.2
//!
//! [query]
//! default_limit = 20
//!
//! [ingest]
//! duplicates = "merge"
//! parallel = true
//! ```

use crate::error::{Result, SearchError};
use crate::search::{DuplicatePolicy, QueryConfig, ScoringConfig, TokenizerConfig};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// How payloads become corpora.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    pub duplicates: DuplicatePolicy,
    /// Build on the rayon pool.
    pub parallel: bool,
}

/// Complete configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub tokenizer: TokenizerConfig,
    pub scoring: ScoringConfig,
    pub query: QueryConfig,
    pub ingest: IngestConfig,
}

impl SearchConfig {
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, SearchError> {
        let config: Self =
            toml::from_str(content).map_err(|e| SearchError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config at {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/docsearch/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docsearch").join("config.toml"))
    }

    /// Loads `path` if given, else the default path if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), SearchError> {
        self.scoring.validate()?;
        self.query.validate()
    }
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Normalization;
    use assert2::check;
    use rstest::rstest;

    #[test]
    fn test_empty_config_is_default() {
        check!(SearchConfig::from_toml_str("").unwrap() == SearchConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = SearchConfig::from_toml_str(
            r#"
            [tokenizer]
            min_token_len = 2
            stop_words = ["the"]
            normalization = "stem_and_fold"

            [scoring.fields]
            title = 5.0

            [scoring.categories]
            section = 1.5

            [query]
            default_limit = 10

            [ingest]
            duplicates = "merge"
            parallel = true
            "#,
        )
        .unwrap();
        check!(config.tokenizer.min_token_len == 2);
        check!(config.tokenizer.normalization == Normalization::StemAndFold);
        check!(config.scoring.fields.title == 5.0);
        check!(config.scoring.fields.text == 1.0);
        check!(config.scoring.categories["section"] == 1.5);
        check!(config.query.default_limit == 10);
        check!(config.query.max_limit == 500);
        check!(config.ingest.duplicates == DuplicatePolicy::Merge);
        check!(config.ingest.parallel);
    }

    #[rstest]
    #[case("[scoring.fields]\ntext = -1.0")]
    #[case("[scoring.categories]\npage = 0.0")]
    #[case("[query]\nmax_limit = 0")]
    #[case("[tokenizer]\nunknown = 1")]
    #[case("[index]\nfoo = 1")]
    fn test_invalid_config(#[case] content: &str) {
        check!(let Err(SearchError::InvalidConfig(_)) = SearchConfig::from_toml_str(content));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[query]\ndefault_limit = 0").unwrap();
        let message = format!("{:#}", SearchConfig::load(&path).unwrap_err());
        check!(message.contains("config.toml"));
    }

    #[test]
    fn test_expand_tilde() {
        check!(expand_tilde("/abs/path") == "/abs/path");
        check!(expand_tilde("relative") == "relative");
        if let Some(home) = dirs::home_dir() {
            check!(expand_tilde("~") == home.display().to_string());
            check!(expand_tilde("~/x").ends_with("x"));
        }
    }
}
