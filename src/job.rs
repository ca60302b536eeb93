//! Job-scoped artifact naming and cleanup.
//!
//! Every file a job writes lives directly in the work directory and starts
//! with the job id, so the whole set can be enumerated and removed without
//! tracking individual paths.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// One generation attempt for one item.
#[derive(Debug, Clone)]
pub struct Job {
    id: String,
    work_dir: PathBuf,
}

impl Job {
    /// New job with a random id under `work_dir`.
    #[must_use]
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_id(work_dir, Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn with_id(work_dir: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            work_dir: work_dir.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.work_dir.join(format!("{}_{suffix}", self.id))
    }

    /// Waveform for synthesis chunk `index`
    #[must_use]
    pub fn chunk_wav(&self, index: usize) -> PathBuf {
        self.file(&format!("chunk{index:03}.wav"))
    }

    /// Concatenated narration
    #[must_use]
    pub fn narration_wav(&self) -> PathBuf {
        self.file("narration.wav")
    }

    /// Where the transcriber leaves its JSON for the narration
    #[must_use]
    pub fn transcript_json(&self) -> PathBuf {
        self.file("narration.json")
    }

    #[must_use]
    pub fn srt(&self) -> PathBuf {
        self.file("captions.srt")
    }

    #[must_use]
    pub fn ass(&self) -> PathBuf {
        self.file("captions.ass")
    }

    #[must_use]
    pub fn framed_video(&self) -> PathBuf {
        self.file("framed.mp4")
    }

    #[must_use]
    pub fn burned_video(&self) -> PathBuf {
        self.file("burned.mp4")
    }

    /// The deliverable; survives [`Job::purge_intermediates`].
    #[must_use]
    pub fn final_video(&self) -> PathBuf {
        self.work_dir.join(format!("{}.mp4", self.id))
    }

    /// All files currently present that belong to this job.
    pub fn files(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.work_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Cannot list {}: {e}", self.work_dir.display());
                }
                return Vec::new();
            }
        };
        entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&self.id))
            })
            .collect()
    }

    /// Remove everything except the final artifact. Never fails.
    pub fn purge_intermediates(&self) -> usize {
        let keep = self.final_video();
        self.remove_matching(|p| p != keep.as_path())
    }

    /// Remove every file of this job. Never fails.
    pub fn purge(&self) -> usize {
        self.remove_matching(|_| true)
    }

    fn remove_matching(&self, select: impl Fn(&Path) -> bool) -> usize {
        let mut removed = 0;
        for path in self.files() {
            if !select(&path) {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove {}: {e}", path.display()),
            }
        }
        if removed > 0 {
            debug!("Job {}: removed {removed} file(s)", self.id);
        }
        removed
    }
}

/// Delete a file, logging rather than failing.
pub(crate) async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {e}", path.display()),
    }
}
