//! Speech synthesis boundary.
//!
//! The voice engine is a black box: one text chunk in, one WAV file out.
//! The pipeline owns chunking, sequential invocation and concatenation.

pub mod wav;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::SynthesisConfig;
use crate::error::{ReelError, Result};
use crate::job::Job;

pub use wav::{concat_wavs, wav_duration};

/// A voice engine.
///
/// `warm` and `release` bracket a batch item so heavy engines can load a
/// model once and give the memory back afterwards; both default to no-ops.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn warm(&self) -> Result<()> {
        Ok(())
    }

    /// Render `text` into a WAV file at `output`.
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()>;

    async fn release(&self) {}
}

/// External voice engine binary.
///
/// The chunk text goes to stdin; `{output}` in the argument list is replaced
/// with the target WAV path.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    #[must_use]
    pub fn new(config: &SynthesisConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    fn args_for(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace("{output}", &output))
            .collect()
    }
}

#[async_trait]
impl Synthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        let args = self.args_for(output);
        crate::process::run_with_stdin(&self.program, &args, text.as_bytes().to_vec())
            .await
            .map_err(ReelError::Synthesis)?;

        let probe_path = output.to_path_buf();
        let measured = tokio::task::spawn_blocking(move || wav_duration(&probe_path))
            .await
            .map_err(|e| ReelError::Synthesis(format!("duration task panicked: {e}")))?;
        match measured {
            Ok(secs) if secs > 0.0 => Ok(()),
            Ok(_) => Err(ReelError::Synthesis(format!(
                "'{}' produced empty audio at {}",
                self.program,
                output.display()
            ))),
            Err(e) => Err(ReelError::Synthesis(format!(
                "'{}' produced no usable audio at {}: {e}",
                self.program,
                output.display()
            ))),
        }
    }
}

/// Synthesize each chunk in order and join them into the job's narration
/// track. Chunk files are removed once joined. Returns the narration path and
/// its duration in seconds.
pub async fn synthesize_narration(
    synthesizer: &dyn Synthesizer,
    chunks: &[String],
    job: &Job,
) -> Result<(PathBuf, f64)> {
    if chunks.is_empty() {
        return Err(ReelError::Synthesis("nothing to narrate".to_string()));
    }

    let mut parts = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let path = job.chunk_wav(i);
        debug!(
            "Synthesizing chunk {}/{}: {} words",
            i + 1,
            chunks.len(),
            crate::text::word_count(chunk)
        );
        synthesizer.synthesize(chunk, &path).await?;
        parts.push(path);
    }

    let narration = job.narration_wav();
    let join_parts = parts.clone();
    let join_target = narration.clone();
    let duration = tokio::task::spawn_blocking(move || concat_wavs(&join_parts, &join_target))
        .await
        .map_err(|e| ReelError::Synthesis(format!("concatenation task panicked: {e}")))??;

    for part in &parts {
        crate::job::remove_quietly(part).await;
    }
    info!("Narration: {} chunk(s), {duration:.1}s", chunks.len());
    Ok((narration, duration))
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::fake::ToneSynthesizer;
    use super::*;

    #[test]
    fn output_placeholder_is_substituted() {
        let synth = CommandSynthesizer::new(&SynthesisConfig {
            program: "piper".to_string(),
            args: vec!["--output_file".to_string(), "{output}".to_string()],
        });
        assert_eq!(
            synth.args_for(Path::new("/w/a.wav")),
            vec!["--output_file".to_string(), "/w/a.wav".to_string()]
        );
    }

    #[tokio::test]
    async fn command_that_writes_nothing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let synth = CommandSynthesizer::new(&SynthesisConfig {
            program: "true".to_string(),
            args: Vec::new(),
        });
        let err = synth
            .synthesize("hello", &dir.path().join("x.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Synthesis(_)));
    }

    #[tokio::test]
    async fn command_that_writes_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let synth = CommandSynthesizer::new(&SynthesisConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "printf 'not a wav' > \"$0\"".to_string(),
                "{output}".to_string(),
            ],
        });
        let err = synth
            .synthesize("hello", &dir.path().join("x.wav"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no usable audio"));
    }

    #[tokio::test]
    async fn command_output_is_accepted_when_it_is_audio() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("tone.wav");
        wav::write_test_wav(&source, 0.5, 8_000);
        let synth = CommandSynthesizer::new(&SynthesisConfig {
            program: "cp".to_string(),
            args: vec![source.to_string_lossy().to_string(), "{output}".to_string()],
        });
        synth
            .synthesize("hello", &dir.path().join("out.wav"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn narration_joins_chunks_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let job = Job::with_id(dir.path(), "j");
        let synth = ToneSynthesizer::default();
        let chunks = vec!["one two three".to_string(), "four five".to_string()];

        let (path, secs) = synthesize_narration(&synth, &chunks, &job).await.unwrap();
        assert_eq!(path, job.narration_wav());
        assert!((secs - 1.5).abs() < 1e-3);
        assert_eq!(synth.calls.load(Ordering::SeqCst), 2);
        assert!(!job.chunk_wav(0).exists());
        assert_eq!(job.files(), vec![job.narration_wav()]);
    }
}
