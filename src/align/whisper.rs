//! Whisper CLI transcriber.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;
use tokio::process::Command;
use tracing::debug;

use super::Transcriber;
use crate::captions::TimedWord;
use crate::config::AlignmentConfig;
use crate::error::{ReelError, Result};

/// Whisper transcription output format (JSON)
#[derive(Debug, Clone, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Clone, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Clone, Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: f64,
}

/// Flatten `segments[].words[]` into timed words.
pub fn parse_whisper_json(json: &str) -> Result<Vec<TimedWord>> {
    let output: WhisperOutput = serde_json::from_str(json)?;
    Ok(output
        .segments
        .into_iter()
        .flat_map(|s| s.words)
        .filter(|w| !w.word.trim().is_empty())
        .map(|w| TimedWord::new(w.word.trim(), w.start, w.end))
        .collect())
}

/// Runs the `whisper` command-line tool with word timestamps enabled.
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    whisper_path: String,
    model: String,
    language: String,
}

impl WhisperTranscriber {
    #[must_use]
    pub fn new(config: &AlignmentConfig) -> Self {
        Self {
            whisper_path: config.whisper_path.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
        }
    }

    fn args(&self, audio: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--word_timestamps".to_string(),
            "True".to_string(),
        ];
        if self.language != "auto" {
            args.push("--language".to_string());
            args.push(self.language.clone());
        }
        args
    }

    /// Check if whisper is available
    pub async fn check_available(&self) -> bool {
        Command::new(&self.whisper_path)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|s| s.success())
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path, output_dir: &Path) -> Result<Vec<TimedWord>> {
        let args = self.args(audio, output_dir);
        debug!("Running whisper with args: {:?}", args);

        let output = Command::new(&self.whisper_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                ReelError::Transcription(format!("failed to run {}: {e}", self.whisper_path))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::Transcription(format!(
                "whisper exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let json_path = output_dir.join(format!("{stem}.json"));
        let json = fs::read_to_string(&json_path).await.map_err(|e| {
            ReelError::Transcription(format!(
                "whisper output {} unreadable: {e}",
                json_path.display()
            ))
        })?;
        let words = parse_whisper_json(&json)?;

        crate::job::remove_quietly(&json_path).await;
        Ok(words)
    }
}
