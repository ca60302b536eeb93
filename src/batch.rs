//! Batch orchestration.
//!
//! Picks the best eligible records, then runs each one through generate,
//! publish and state update in turn. Items are strictly sequential and
//! isolated: whatever happens to one, its job files are purged, the engines
//! are released, and the loop moves on.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Isolation};
use crate::error::{ReelError, Result};
use crate::generate::{Engines, Generator};
use crate::job::{remove_quietly, Job};
use crate::publish::{PublishRequest, Publisher};
use crate::store::{ContentRecord, ContentStore, GenerationStatus, RecordFilter};
use crate::text;
use crate::video::MediaToolkit;

/// A record picked for the next batch.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: ContentRecord,
    /// Estimated final duration after the speed change, seconds
    pub estimated_secs: f64,
}

/// Totals for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub successful: usize,
    pub failed: usize,
}

/// How a single item ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Generated and published
    Posted,
    /// Generation failed; the record is `failed`
    GenerationFailed,
    /// Generated, but the upload failed; the record stays unposted
    PublishFailed,
}

impl ItemOutcome {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Posted
    }
}

/// Final duration estimate for a record: speech words over the speaking
/// rate, shortened by the speed multiplier.
#[must_use]
pub fn estimate_secs(record: &ContentRecord, config: &Config) -> f64 {
    let narration = &config.narration;
    let prepared = text::prepare(&record.item.title, &record.item.body, narration.narrate_title);
    text::estimate_narration_secs(prepared.speech_word_count(), narration.speaking_rate)
        / narration.speed_multiplier
}

fn by_score_then_id(a: &ContentRecord, b: &ContentRecord) -> Ordering {
    b.item
        .score
        .cmp(&a.item.score)
        .then_with(|| a.item.source_id.cmp(&b.item.source_id))
}

/// Pick up to `items_per_batch` records, best score first.
///
/// Eligible records are unposted, pending or failed, at or above the score
/// threshold, under the attempt cap if one is set, and short enough once
/// narrated. The result depends only on the records and the config.
#[must_use]
pub fn select_candidates(records: Vec<ContentRecord>, config: &Config) -> Vec<Candidate> {
    let batch = &config.batch;
    let mut eligible: Vec<ContentRecord> = records
        .into_iter()
        .filter(ContentRecord::is_selectable)
        .filter(|r| r.item.score >= batch.min_score)
        .filter(|r| batch.max_attempts.map_or(true, |cap| r.attempts < cap))
        .collect();
    eligible.sort_by(by_score_then_id);

    let mut candidates: Vec<Candidate> = eligible
        .into_iter()
        .filter_map(|record| {
            let estimated_secs = estimate_secs(&record, config);
            if estimated_secs <= batch.max_item_secs {
                Some(Candidate {
                    record,
                    estimated_secs,
                })
            } else {
                debug!(
                    "Skipping {}: ~{estimated_secs:.0}s exceeds {:.0}s",
                    record.source_id(),
                    batch.max_item_secs
                );
                None
            }
        })
        .collect();
    candidates.sort_by(|a, b| by_score_then_id(&a.record, &b.record));
    candidates.truncate(batch.items_per_batch);
    candidates
}

/// Drives batches against a store, engines, a media toolkit and a publisher.
pub struct Orchestrator<'a> {
    config: &'a Config,
    store: &'a dyn ContentStore,
    engines: &'a Engines,
    toolkit: &'a dyn MediaToolkit,
    publisher: &'a dyn Publisher,
    config_path: Option<PathBuf>,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(
        config: &'a Config,
        store: &'a dyn ContentStore,
        engines: &'a Engines,
        toolkit: &'a dyn MediaToolkit,
        publisher: &'a dyn Publisher,
    ) -> Self {
        Self {
            config,
            store,
            engines,
            toolkit,
            publisher,
            config_path: None,
        }
    }

    /// Config file handed to subprocess workers.
    #[must_use]
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Current selection, without changing any record.
    pub async fn select(&self) -> Result<Vec<Candidate>> {
        let filter = RecordFilter::new()
            .with_statuses(&[GenerationStatus::Pending, GenerationStatus::Failed])
            .with_posted(false)
            .with_min_score(self.config.batch.min_score);
        let records = self.store.query(&filter).await?;
        Ok(select_candidates(records, self.config))
    }

    /// Run one batch.
    ///
    /// Only setup problems are returned as errors; a missing background
    /// clip aborts before any record is touched. Per-item failures are
    /// counted in the report.
    pub async fn run_batch(&self) -> Result<BatchReport> {
        let background = &self.config.paths.background_clip;
        if !background.exists() {
            return Err(ReelError::MissingBackground(background.clone()));
        }
        self.store.reload().await?;

        let candidates = self.select().await?;
        info!(
            "Starting batch: {} item(s) selected ({:?})",
            candidates.len(),
            self.config.batch.isolation
        );

        let total = candidates.len();
        let mut report = BatchReport::default();
        for (i, candidate) in candidates.into_iter().enumerate() {
            let id = candidate.record.source_id().to_string();
            info!(
                "[{}/{}] {} (score {}, ~{:.0}s)",
                i + 1,
                total,
                id,
                candidate.record.item.score,
                candidate.estimated_secs
            );
            let success = match self.config.batch.isolation {
                Isolation::InProcess => self.process_record(candidate.record).await.is_success(),
                Isolation::Subprocess => self.process_in_child(&id).await,
            };
            if success {
                report.successful += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            "Batch finished: {} successful, {} failed",
            report.successful, report.failed
        );
        Ok(report)
    }

    /// Process one stored record by id. Entry point of subprocess workers.
    pub async fn process_item(&self, source_id: &str) -> Result<ItemOutcome> {
        let record = self
            .store
            .get(source_id)
            .await?
            .ok_or_else(|| ReelError::Store(format!("no record with id {source_id}")))?;
        if !record.is_selectable() {
            return Err(ReelError::InvalidTransition {
                source_id: source_id.to_string(),
                from: record.generation_status,
                action: "process",
            });
        }
        Ok(self.process_record(record).await)
    }

    /// Generate, publish and record one item, then clean up unconditionally.
    async fn process_record(&self, mut record: ContentRecord) -> ItemOutcome {
        let job = Job::new(&self.config.paths.work_dir);
        let id = record.source_id().to_string();

        let outcome = match self.generate_and_publish(&mut record, &job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{id}: {e}");
                self.settle_after_error(&mut record, &e).await;
                ItemOutcome::GenerationFailed
            }
        };

        job.purge();
        self.engines.release().await;
        outcome
    }

    /// Leave no `processing` record behind when the store failed mid-item.
    async fn settle_after_error(&self, record: &mut ContentRecord, error: &ReelError) {
        let failed = match record.generation_status {
            GenerationStatus::Processing => record.fail_generation(error.to_string()).is_ok(),
            GenerationStatus::Failed => true,
            _ => false,
        };
        if failed {
            if let Err(e) = self.store.upsert(record).await {
                error!("{}: cannot record failure: {e}", record.source_id());
            }
        }
    }

    async fn generate_and_publish(
        &self,
        record: &mut ContentRecord,
        job: &Job,
    ) -> Result<ItemOutcome> {
        let mut started = record.clone();
        started.begin_generation()?;
        self.store.upsert(&started).await?;
        *record = started;

        let generated = match self.engines.warm().await {
            Ok(()) => {
                Generator::new(self.config, self.engines, self.toolkit)
                    .generate(&record.item, job)
                    .await
            }
            Err(e) => Err(e),
        };

        let artifact = match generated {
            Ok(path) => path,
            Err(e) => {
                warn!("Generation failed for {}: {e}", record.source_id());
                record.fail_generation(e.to_string())?;
                self.store.upsert(record).await?;
                return Ok(ItemOutcome::GenerationFailed);
            }
        };
        let mut completed = record.clone();
        completed.complete_generation()?;
        self.store.upsert(&completed).await?;
        *record = completed;

        let request =
            PublishRequest::for_item(&record.item, artifact.clone(), &self.config.publish);
        let posted = match self.publisher.publish(&request).await {
            Ok(external_id) => record.mark_posted(&external_id),
            Err(e) => Err(e),
        };

        let outcome = match posted {
            Ok(()) => {
                remove_quietly(&artifact).await;
                info!(
                    "Posted {} as {}",
                    record.source_id(),
                    record.external_video_id.as_deref().unwrap_or_default()
                );
                ItemOutcome::Posted
            }
            Err(e) => {
                warn!("Publishing failed for {}: {e}", record.source_id());
                record.record_publish_failure(e.to_string())?;
                ItemOutcome::PublishFailed
            }
        };
        // the upload already happened; a failed write must not change the outcome
        if let Err(e) = self.store.upsert(record).await {
            error!("{}: cannot store {outcome:?}: {e}", record.source_id());
        }
        Ok(outcome)
    }

    /// Run one item in a fresh copy of this binary and read the outcome
    /// back from the store.
    async fn process_in_child(&self, source_id: &str) -> bool {
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                error!("Cannot locate own executable for {source_id}: {e}");
                return false;
            }
        };
        let mut command = Command::new(exe);
        if let Some(ref path) = self.config_path {
            command.arg("--config").arg(path);
        }
        command
            .args(["process-item", "--id", source_id])
            .stdin(Stdio::null());

        match command.status().await {
            Ok(status) if !status.success() => {
                warn!("Worker for {source_id} exited with {status}");
            }
            Ok(_) => debug!("Worker for {source_id} finished"),
            Err(e) => {
                error!("Failed to start worker for {source_id}: {e}");
                return false;
            }
        }

        if let Err(e) = self.store.reload().await {
            error!("Cannot reload store after {source_id}: {e}");
            return false;
        }
        match self.store.get(source_id).await {
            Ok(Some(record)) => record.posted,
            Ok(None) => false,
            Err(e) => {
                error!("Cannot read back {source_id}: {e}");
                false
            }
        }
    }
}
