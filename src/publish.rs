//! Publishing boundary.
//!
//! A [`Publisher`] takes a finished artifact plus its metadata and returns
//! the external id the platform assigned. The default [`CommandPublisher`]
//! hands the request to an uploader program as JSON on stdin and expects
//! `{"id": "..."}` on stdout.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PublishConfig;
use crate::error::{ReelError, Result};
use crate::store::ContentItem;

/// Longest title the platform accepts, suffix included
pub const MAX_TITLE_CHARS: usize = 100;
/// Body characters quoted in the description
const DESCRIPTION_EXCERPT_CHARS: usize = 500;

/// Metadata sent with an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub video_path: PathBuf,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub visibility: String,
}

impl PublishRequest {
    /// Build the request for `item`'s artifact at `video_path`.
    #[must_use]
    pub fn for_item(item: &ContentItem, video_path: PathBuf, config: &PublishConfig) -> Self {
        Self {
            video_path,
            title: full_title(&item.title, &config.title_suffix),
            description: description(item),
            tags: merge_tags(&config.default_tags, &item.tags()),
            category_id: config.category_id.clone(),
            visibility: config.visibility.clone(),
        }
    }
}

/// Title with the suffix appended, shortened so the whole stays within
/// [`MAX_TITLE_CHARS`].
#[must_use]
pub fn full_title(title: &str, suffix: &str) -> String {
    let room = MAX_TITLE_CHARS.saturating_sub(suffix.chars().count());
    let title = title.trim();
    let kept: String = title.chars().take(room).collect();
    let full = format!("{}{suffix}", kept.trim_end());
    full.chars().take(MAX_TITLE_CHARS).collect()
}

fn description(item: &ContentItem) -> String {
    let excerpt: String = item.body.chars().take(DESCRIPTION_EXCERPT_CHARS).collect();
    format!(
        "{excerpt}...\n\nFrom r/{}\nOriginal: {}\n\n#RedditStories #Shorts #Storytelling",
        item.collection, item.source_url
    )
}

/// Defaults first, then item tags, dropping case-insensitive duplicates.
#[must_use]
pub fn merge_tags(defaults: &[String], item_tags: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for tag in defaults.iter().chain(item_tags) {
        let tag = tag.trim();
        if tag.is_empty() || merged.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        merged.push(tag.to_string());
    }
    merged
}

/// Upload seam.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload and return the external id.
    async fn publish(&self, request: &PublishRequest) -> Result<String>;
}

/// JSON expected from the uploader on stdout.
#[derive(Deserialize)]
struct UploaderOutput {
    id: String,
}

/// Runs an external uploader binary.
#[derive(Debug, Clone)]
pub struct CommandPublisher {
    program: String,
    args: Vec<String>,
}

impl CommandPublisher {
    #[must_use]
    pub fn new(config: &PublishConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl Publisher for CommandPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<String> {
        if !request.video_path.exists() {
            return Err(ReelError::MissingArtifact(request.video_path.clone()));
        }
        let input = serde_json::to_vec(request)?;
        debug!("Uploading {} via '{}'", request.video_path.display(), self.program);

        let output = crate::process::run_with_stdin(&self.program, &self.args, input)
            .await
            .map_err(ReelError::Publish)?;

        let parsed: UploaderOutput = serde_json::from_slice(&output.stdout).map_err(|e| {
            ReelError::Publish(format!("uploader '{}' returned invalid JSON: {e}", self.program))
        })?;
        let id = parsed.id.trim().to_string();
        if id.is_empty() {
            return Err(ReelError::Publish(format!(
                "uploader '{}' returned an empty id",
                self.program
            )));
        }
        info!("Published '{}' as {id}", request.title);
        Ok(id)
    }
}
