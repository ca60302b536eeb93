//! Single-file JSON store.
//!
//! The whole collection is held in memory and rewritten on every upsert via
//! a temp file and rename, so a crash mid-write leaves the previous file
//! intact. Memory only changes once the write has succeeded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use super::{ContentRecord, ContentStore};
use crate::error::{ReelError, Result};

/// Records persisted as a JSON array at one path.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, ContentRecord>>,
}

impl JsonStore {
    /// Open the store, starting empty if the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = load(&path).await?;
        tracing::debug!("Opened store {} with {} record(s)", path.display(), records.len());
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &BTreeMap<String, ContentRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let list: Vec<&ContentRecord> = records.values().collect();
        let json = serde_json::to_string_pretty(&list)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

async fn load(path: &Path) -> Result<BTreeMap<String, ContentRecord>> {
    match fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(content) => {
            let list: Vec<ContentRecord> = serde_json::from_str(&content)
                .map_err(|e| ReelError::Store(format!("corrupt store {}: {e}", path.display())))?;
            Ok(list
                .into_iter()
                .map(|r| (r.item.source_id.clone(), r))
                .collect())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ContentStore for JsonStore {
    /// Pick up writes made by other processes.
    async fn reload(&self) -> Result<()> {
        let fresh = load(&self.path).await?;
        *self.records.lock().await = fresh;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ContentRecord>> {
        Ok(self.records.lock().await.values().cloned().collect())
    }

    async fn get(&self, source_id: &str) -> Result<Option<ContentRecord>> {
        Ok(self.records.lock().await.get(source_id).cloned())
    }

    async fn upsert(&self, record: &ContentRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        next.insert(record.item.source_id.clone(), record.clone());
        self.persist(&next).await?;
        *records = next;
        Ok(())
    }
}
