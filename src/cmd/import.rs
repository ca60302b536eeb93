use std::path::Path;

use anyhow::{Context, Result};

use storyreel::store::{import_items, ContentItem, ContentStore};

use super::App;

pub async fn cmd_import(app: &App, file: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let items: Vec<ContentItem> = serde_json::from_str(&content)
        .with_context(|| format!("parsing items from {}", file.display()))?;

    let total = items.len();
    let store = app.open_store().await?;
    let added = import_items(&store, items).await?;

    eprintln!(
        "📥 {total} item(s) read, {added} new, {} updated ({} records in {})",
        total - added,
        store.list().await?.len(),
        store.path().display()
    );
    Ok(())
}
