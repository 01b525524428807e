pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod persist;
pub mod search;
pub mod types;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use search::{IndexBuilder, InvertedIndex, SearchService};
pub use types::{Category, Field, Fragment, FragmentId, SearchResult};
