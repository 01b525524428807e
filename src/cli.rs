use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "docsearch")]
#[command(about = "Build and query full-text indexes over documentation search payloads", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build an index from a JSON or `documenterSearchIndex` payload
    Build {
        input: String,
        #[arg(short, long)]
        output: String,
        /// Build shards on all cores
        #[arg(long)]
        parallel: bool,
        /// Fold records sharing a location into one fragment
        #[arg(long)]
        merge_duplicates: bool,
    },
    /// Query a built index
    Search {
        index: String,
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print statistics for a built index
    Inspect { index: String },
}

impl Cli {
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .as_deref()
            .map(|path| PathBuf::from(crate::config::expand_tilde(path).as_ref()))
    }
}
