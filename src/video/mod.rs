//! Video composition.
//!
//! All media work goes through the [`MediaToolkit`] trait: probing a clip
//! and running a named ffmpeg pass with a prepared argument list. The
//! default [`Ffmpeg`] toolkit shells out to the configured binaries; tests
//! substitute a fake that records the passes and writes placeholder files.

pub mod compositor;
pub mod probe;
pub mod scene;

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::EncoderConfig;
use crate::error::{ReelError, Result};

pub use compositor::{
    burn_args, finish_args, frame_args, output_frame, tempo_chain, CompositionPlan, Compositor,
    CropPlan, Stage,
};
pub use probe::{parse_probe, VideoInfo};
pub use scene::{scene_need, select_window, SceneWindow};

/// Seam for the external media tools.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Duration and dimensions of a video file.
    async fn probe(&self, path: &Path) -> Result<VideoInfo>;

    /// Run one encoder pass to completion. Non-zero exit is an error.
    async fn run(&self, stage: Stage, args: &[String]) -> Result<()>;
}

/// ffmpeg/ffprobe subprocess toolkit
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl Ffmpeg {
    #[must_use]
    pub fn new(encoder: &EncoderConfig) -> Self {
        Self {
            ffmpeg_path: encoder.ffmpeg_path.clone(),
            ffprobe_path: encoder.ffprobe_path.clone(),
        }
    }

    /// Check if ffmpeg is available
    pub async fn check_available(&self) -> bool {
        Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|s| s.success())
    }
}

#[async_trait]
impl MediaToolkit for Ffmpeg {
    async fn probe(&self, path: &Path) -> Result<VideoInfo> {
        let output = Command::new(&self.ffprobe_path)
            .args(probe::probe_args(path))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ReelError::Ffmpeg(format!("failed to run {}: {e}", self.ffprobe_path)))?;

        if !output.status.success() {
            return Err(ReelError::Ffmpeg(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_probe(&output.stdout)
    }

    async fn run(&self, stage: Stage, args: &[String]) -> Result<()> {
        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ReelError::Ffmpeg(format!("failed to run {}: {e}", self.ffmpeg_path)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(ReelError::Ffmpeg(format!(
                "{stage} pass exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            )));
        }
        Ok(())
    }
}
