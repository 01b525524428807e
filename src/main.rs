use anyhow::Context;
use clap::Parser;
use docsearch::cli::{Cli, Commands};
use docsearch::config::{SearchConfig, expand_tilde};
use docsearch::search::{DuplicatePolicy, SearchService};
use docsearch::{format, logging, persist};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = SearchConfig::load_or_default(cli.config_path().as_deref())?;

    match cli.command {
        Commands::Build {
            input,
            output,
            parallel,
            merge_duplicates,
        } => {
            config.ingest.parallel |= parallel;
            if merge_duplicates {
                config.ingest.duplicates = DuplicatePolicy::Merge;
            }
            let input = PathBuf::from(expand_tilde(&input).as_ref());
            let output = PathBuf::from(expand_tilde(&output).as_ref());

            let payload = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read payload {}", input.display()))?;
            let service = SearchService::new(&config)?;
            let index = tokio::task::spawn_blocking(move || service.rebuild_from_payload(&payload))
                .await
                .context("Index build task panicked")?
                .with_context(|| format!("Failed to build index from {}", input.display()))?;

            let (fragments, terms) = (index.fragment_count(), index.term_count());
            persist::store(index, &output).await?;
            println!(
                "Indexed {} fragments ({} terms) into {}",
                fragments,
                terms,
                output.display()
            );
        }
        Commands::Search {
            index,
            query,
            limit,
            json,
        } => {
            let index = persist::load(&PathBuf::from(expand_tilde(&index).as_ref())).await?;
            let results = index.search_results(&query, limit, &config.query)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                print!("{}", format::format_no_results(&index, &query, &config.query));
            } else {
                print!("{}", format::format_search_results(&results, &query));
            }
        }
        Commands::Inspect { index } => {
            let path = PathBuf::from(expand_tilde(&index).as_ref());
            let index = persist::load(&path).await?;
            println!("Index: {}", path.display());
            print!("{}", format::format_stats(&index, &index.stats()));
        }
    }

    Ok(())
}
