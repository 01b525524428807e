//! Error handling types and utilities.

/// A specialized Result type for docsearch application glue (CLI, file I/O).
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods. Library operations return [`SearchError`] directly.
pub type Result<T> = anyhow::Result<T>;

/// Errors raised while ingesting fragments, building, querying or decoding an index.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Two fragments in one build share a location.
    #[error("duplicate fragment location '{location}' (fragments {first} and {second})")]
    DuplicateLocation {
        location: String,
        first: usize,
        second: usize,
    },
    /// A fragment violates a record invariant (e.g. empty location).
    #[error("invalid fragment at position {position}: {reason}")]
    InvalidFragment { position: usize, reason: String },
    /// The fragment collection handed to the builder was empty.
    #[error("cannot build an index from an empty fragment collection")]
    EmptyCollection,
    /// A query was issued before any index was installed.
    #[error("no search index has been built yet")]
    IndexNotBuilt,
    /// A serialized index failed validation.
    #[error("corrupt index data: {0}")]
    CorruptData(String),
    /// A serialized index carries a format version this build cannot read.
    #[error("unsupported index format version {found} (this build reads version {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },
    /// The query text exceeds the configured length cap.
    #[error("query is {len} characters long, the maximum is {max}")]
    QueryTooLong { len: usize, max: usize },
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The fragment payload could not be parsed.
    #[error("malformed fragment payload: {0}")]
    MalformedPayload(String),
}

impl SearchError {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptData(message.into())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}
