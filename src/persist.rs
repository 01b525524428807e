//! Async persistence of encoded indexes.

use crate::error::Result;
use crate::search::{InvertedIndex, codec};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads and validates an index file.
pub async fn load(path: &Path) -> Result<InvertedIndex> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read index file {}", path.display()))?;

    // Decoding validates every posting, so keep it off the runtime threads
    let index = tokio::task::spawn_blocking(move || codec::decode(&bytes))
        .await
        .context("Index decoding task panicked")?
        .inspect_err(|e| tracing::warn!("Rejected index file {}: {}", path.display(), e))
        .with_context(|| format!("Failed to decode index file {}", path.display()))?;

    tracing::info!(
        "Loaded search index from {} ({} terms, {} fragments)",
        path.display(),
        index.term_count(),
        index.fragment_count()
    );
    Ok(index)
}

/// Encodes `index` and writes it to `path`.
///
/// The blob goes to a sibling temporary file first and is renamed into place,
/// so readers never observe a partially written index.
pub async fn store(index: Arc<InvertedIndex>, path: &Path) -> Result<()> {
    let bytes = tokio::task::spawn_blocking(move || codec::encode(&index))
        .await
        .context("Index encoding task panicked")?
        .context("Failed to encode index")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let temp = temp_path(path);
    if let Err(e) = tokio::fs::write(&temp, &bytes).await {
        tracing::warn!("Failed to write index to {}: {}", temp.display(), e);
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e).with_context(|| format!("Failed to write index file {}", temp.display()));
    }
    if let Err(e) = tokio::fs::rename(&temp, path).await {
        tracing::warn!("Failed to move {} to {}: {}", temp.display(), path.display(), e);
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e)
            .with_context(|| format!("Failed to move index into place at {}", path.display()));
    }

    tracing::debug!("Stored {} byte search index at {}", bytes.len(), path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn test_temp_path_is_sibling() {
        check!(temp_path(Path::new("/data/docs.idx")) == Path::new("/data/docs.idx.tmp"));
        check!(temp_path(Path::new("docs.idx")) == Path::new("docs.idx.tmp"));
    }
}
