//! Keyed record storage.
//!
//! The pipeline only needs list/get/upsert and a status filter, so the
//! [`ContentStore`] trait stays small. [`MemoryStore`] backs tests and
//! dry runs; [`JsonStore`] persists to a single JSON file.

pub mod json;
pub mod record;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

pub use json::JsonStore;
pub use record::{ContentItem, ContentRecord, GenerationStatus};

/// Criteria for [`ContentStore::query`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub statuses: Option<Vec<GenerationStatus>>,
    pub posted: Option<bool>,
    pub min_score: Option<i64>,
}

impl RecordFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_statuses(mut self, statuses: &[GenerationStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    #[must_use]
    pub fn with_posted(mut self, posted: bool) -> Self {
        self.posted = Some(posted);
        self
    }

    #[must_use]
    pub fn with_min_score(mut self, min_score: i64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &ContentRecord) -> bool {
        if let Some(ref statuses) = self.statuses {
            if !statuses.contains(&record.generation_status) {
                return false;
            }
        }
        if self.posted.is_some_and(|p| p != record.posted) {
            return false;
        }
        if self.min_score.is_some_and(|min| record.item.score < min) {
            return false;
        }
        true
    }
}

/// Persistence seam for content records.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All records, ordered by source id.
    async fn list(&self) -> Result<Vec<ContentRecord>>;

    async fn get(&self, source_id: &str) -> Result<Option<ContentRecord>>;

    /// Insert or replace by source id.
    async fn upsert(&self, record: &ContentRecord) -> Result<()>;

    /// Re-read backing storage. No-op for stores without one.
    async fn reload(&self) -> Result<()> {
        Ok(())
    }

    async fn query(&self, filter: &RecordFilter) -> Result<Vec<ContentRecord>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }
}

/// Load ingested items, refreshing content on existing records without
/// touching their state. Returns the number of new records.
pub async fn import_items(store: &dyn ContentStore, items: Vec<ContentItem>) -> Result<usize> {
    let mut added = 0;
    for item in items {
        let record = match store.get(&item.source_id).await? {
            Some(mut existing) => {
                existing.refresh_content(item);
                existing
            }
            None => {
                added += 1;
                ContentRecord::new(item)
            }
        };
        store.upsert(&record).await?;
    }
    tracing::info!("Imported {added} new item(s)");
    Ok(added)
}

/// Volatile store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, ContentRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with pending records for the given items.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = ContentItem>) -> Self {
        let records = items
            .into_iter()
            .map(|item| (item.source_id.clone(), ContentRecord::new(item)))
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list(&self) -> Result<Vec<ContentRecord>> {
        Ok(self.records.lock().await.values().cloned().collect())
    }

    async fn get(&self, source_id: &str) -> Result<Option<ContentRecord>> {
        Ok(self.records.lock().await.get(source_id).cloned())
    }

    async fn upsert(&self, record: &ContentRecord) -> Result<()> {
        self.records
            .lock()
            .await
            .insert(record.item.source_id.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::record::sample_item;
    use super::*;

    #[tokio::test]
    async fn query_filters_by_status_and_score() {
        let store = MemoryStore::with_items([
            sample_item("a", 900, 10),
            sample_item("b", 100, 10),
            sample_item("c", 700, 10),
        ]);
        let mut c = store.get("c").await.unwrap().unwrap();
        c.begin_generation().unwrap();
        store.upsert(&c).await.unwrap();

        let filter = RecordFilter::new()
            .with_statuses(&[GenerationStatus::Pending, GenerationStatus::Failed])
            .with_posted(false)
            .with_min_score(500);
        let ids: Vec<String> = store
            .query(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.item.source_id)
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn import_keeps_existing_state() {
        let store = MemoryStore::new();
        assert_eq!(import_items(&store, vec![sample_item("a", 1, 5)]).await.unwrap(), 1);

        let mut a = store.get("a").await.unwrap().unwrap();
        a.begin_generation().unwrap();
        a.fail_generation("boom").unwrap();
        store.upsert(&a).await.unwrap();

        let mut updated = sample_item("a", 42, 5);
        updated.title = "New title".to_string();
        assert_eq!(import_items(&store, vec![updated]).await.unwrap(), 0);

        let a = store.get("a").await.unwrap().unwrap();
        assert_eq!(a.item.score, 42);
        assert_eq!(a.item.title, "New title");
        assert_eq!(a.generation_status, GenerationStatus::Failed);
        assert_eq!(a.attempts, 1);
    }
}
