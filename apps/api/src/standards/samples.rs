use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::errors::AppError;
use crate::standards::models::StandardsPack;

/// Reads every `*.json` pack in `dir`, sorted by file name.
pub async fn load_pack_dir(dir: &Path) -> Result<Vec<StandardsPack>, AppError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading packs directory {}", dir.display()))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .context("listing packs directory")?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut packs = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading pack {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            AppError::MalformedPack(format!("{}: {e}", path.display()))
        })?;
        packs.push(StandardsPack::from_json(value)?);
    }
    info!(dir = %dir.display(), count = packs.len(), "loaded sample packs");
    Ok(packs)
}
