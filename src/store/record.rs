//! Content records and the generation/publishing state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};

/// A narrative unit supplied by ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique id assigned by the source
    pub source_id: String,
    /// Source collection label (e.g. a forum name)
    pub collection: String,
    pub title: String,
    pub body: String,
    /// Popularity score used for ranking
    pub score: i64,
    #[serde(default)]
    pub engagement: i64,
    #[serde(default)]
    pub source_url: String,
}

impl ContentItem {
    /// Tags derived from the item itself, merged with the configured defaults
    /// when publishing.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags = vec!["reddit".to_string(), "stories".to_string(), "shorts".to_string()];
        if !self.collection.is_empty() {
            tags.push(self.collection.to_lowercase());
        }
        tags.push("reddit stories".to_string());
        tags
    }
}

/// Where an item is in the generation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Persisted record: the item plus its generation and publishing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(flatten)]
    pub item: ContentItem,
    #[serde(default)]
    pub generation_status: GenerationStatus,
    #[serde(default)]
    pub generation_error: Option<String>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    /// Number of times the record entered `processing`
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub posted: bool,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub external_video_id: Option<String>,
    #[serde(default)]
    pub upload_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Wrap a freshly ingested item as a pending, unposted record.
    #[must_use]
    pub fn new(item: ContentItem) -> Self {
        let now = Utc::now();
        Self {
            item,
            generation_status: GenerationStatus::Pending,
            generation_error: None,
            generated_at: None,
            attempts: 0,
            posted: false,
            posted_at: None,
            external_video_id: None,
            upload_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.item.source_id
    }

    /// Unposted and either never generated or previously failed.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.posted
            && matches!(
                self.generation_status,
                GenerationStatus::Pending | GenerationStatus::Failed
            )
    }

    /// Replace the content fields from a re-import, keeping all state.
    pub fn refresh_content(&mut self, item: ContentItem) {
        self.item = item;
        self.touch();
    }

    /// pending | failed → processing
    pub fn begin_generation(&mut self) -> Result<()> {
        if !self.is_selectable() {
            return Err(self.invalid("begin generation"));
        }
        self.generation_status = GenerationStatus::Processing;
        self.generation_error = None;
        self.attempts = self.attempts.saturating_add(1);
        self.touch();
        Ok(())
    }

    /// processing → completed
    pub fn complete_generation(&mut self) -> Result<()> {
        self.require_processing("complete generation")?;
        let now = Utc::now();
        self.generation_status = GenerationStatus::Completed;
        self.generation_error = None;
        self.generated_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// processing → failed, keeping the message for the operator
    pub fn fail_generation(&mut self, message: impl Into<String>) -> Result<()> {
        self.require_processing("fail generation")?;
        self.generation_status = GenerationStatus::Failed;
        self.generation_error = Some(message.into());
        self.touch();
        Ok(())
    }

    /// Record a successful upload. Requires a completed generation and a
    /// non-empty external id.
    pub fn mark_posted(&mut self, external_id: &str) -> Result<()> {
        if self.generation_status != GenerationStatus::Completed || self.posted {
            return Err(self.invalid("mark posted"));
        }
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(ReelError::Publish(format!(
                "publisher returned an empty id for {}",
                self.item.source_id
            )));
        }
        let now = Utc::now();
        self.posted = true;
        self.posted_at = Some(now);
        self.external_video_id = Some(external_id.to_string());
        self.upload_error = None;
        self.updated_at = now;
        Ok(())
    }

    /// Keep the upload error; the record stays unposted.
    pub fn record_publish_failure(&mut self, message: impl Into<String>) -> Result<()> {
        if self.posted {
            return Err(self.invalid("record publish failure"));
        }
        self.upload_error = Some(message.into());
        self.touch();
        Ok(())
    }

    fn require_processing(&self, action: &'static str) -> Result<()> {
        if self.generation_status == GenerationStatus::Processing {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> ReelError {
        ReelError::InvalidTransition {
            source_id: self.item.source_id.clone(),
            from: self.generation_status,
            action,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
pub(crate) fn sample_item(id: &str, score: i64, words: usize) -> ContentItem {
    ContentItem {
        source_id: id.to_string(),
        collection: "TrueOffMyChest".to_string(),
        title: format!("Story {id}"),
        body: vec!["word"; words].join(" "),
        score,
        engagement: 10,
        source_url: format!("https://example.com/{id}"),
    }
}
