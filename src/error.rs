//! Error type shared by every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::GenerationStatus;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum ReelError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Subtitle error: {0}")]
    Subtitle(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background clip not found: {}", .0.display())]
    MissingBackground(PathBuf),

    #[error("Invalid transition for {source_id}: {action} while {from}")]
    InvalidTransition {
        source_id: String,
        from: GenerationStatus,
        action: &'static str,
    },

    #[error("Generated artifact missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl ReelError {
    /// Errors that make every further item in a batch pointless.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingBackground(_) | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, ReelError>;
