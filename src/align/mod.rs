//! Word timing.
//!
//! The transcriber reports when each word of the synthesized narration was
//! spoken. Its words are matched to the speech words by position; missing
//! tail words are extrapolated, and a failed transcription degrades to a
//! uniform pace instead of failing the job. Timings are then collapsed from
//! speech words onto display words for the captions.

pub mod whisper;

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::captions::TimedWord;
use crate::config::AlignmentConfig;
use crate::error::Result;
use crate::text::PreparedText;

pub use whisper::{parse_whisper_json, WhisperTranscriber};

/// Smallest step between consecutive word starts, seconds
const MIN_STEP: f64 = 0.001;

/// A speech-to-text engine that reports word timestamps.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn warm(&self) -> Result<()> {
        Ok(())
    }

    /// Transcribe `audio`, using `output_dir` for any scratch files.
    async fn transcribe(&self, audio: &Path, output_dir: &Path) -> Result<Vec<TimedWord>>;

    async fn release(&self) {}
}

/// Timing constants for extrapolation and fallback.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentRules {
    pub extrapolate_gap: f64,
    pub extrapolate_word: f64,
    pub fallback_word: f64,
}

impl Default for AlignmentRules {
    fn default() -> Self {
        Self::from(&AlignmentConfig::default())
    }
}

impl From<&AlignmentConfig> for AlignmentRules {
    fn from(config: &AlignmentConfig) -> Self {
        Self {
            extrapolate_gap: config.extrapolate_gap_secs,
            extrapolate_word: config.extrapolate_word_secs,
            fallback_word: config.fallback_word_secs,
        }
    }
}

/// Assign a time to every speech word.
///
/// With no transcript (or an empty one) words are spaced uniformly from zero.
/// Otherwise word `i` takes transcript word `i`'s timing and any words past
/// the end of the transcript follow the previous word after a short gap.
#[must_use]
pub fn time_speech_words(
    speech_words: &[&str],
    transcript: Option<&[TimedWord]>,
    rules: &AlignmentRules,
) -> Vec<TimedWord> {
    let transcript = transcript.filter(|t| !t.is_empty());
    let mut timed = Vec::with_capacity(speech_words.len());

    match transcript {
        None => {
            for (i, word) in speech_words.iter().enumerate() {
                let start = i as f64 * rules.fallback_word;
                timed.push(TimedWord::new(*word, start, start + rules.fallback_word));
            }
        }
        Some(transcript) => {
            let mut last_end = 0.0;
            for (i, word) in speech_words.iter().enumerate() {
                let (start, end) = match transcript.get(i) {
                    Some(t) => (t.start, t.end),
                    None => {
                        let start = last_end + rules.extrapolate_gap;
                        (start, start + rules.extrapolate_word)
                    }
                };
                last_end = end;
                timed.push(TimedWord::new(*word, start, end));
            }
        }
    }

    sanitize(&mut timed);
    timed
}

/// Force starts to be non-negative and strictly increasing, and every end
/// to follow its start.
pub fn sanitize(words: &mut [TimedWord]) {
    let mut previous_start: Option<f64> = None;
    for word in words.iter_mut() {
        let mut start = if word.start.is_finite() { word.start.max(0.0) } else { 0.0 };
        if let Some(prev) = previous_start {
            if start <= prev {
                start = prev + MIN_STEP;
            }
        }
        let end = if word.end.is_finite() { word.end } else { start };
        word.start = start;
        word.end = if end > start { end } else { start + MIN_STEP };
        previous_start = Some(start);
    }
}

/// Map speech-word timings back onto display words through the word map.
#[must_use]
pub fn collapse_to_display(speech: &[TimedWord], prepared: &PreparedText) -> Vec<TimedWord> {
    prepared
        .words
        .iter()
        .filter_map(|span| {
            let first = speech.get(span.speech.start)?;
            let last = speech.get(span.speech.end.checked_sub(1)?)?;
            Some(TimedWord::new(span.display.clone(), first.start, last.end.max(first.end)))
        })
        .collect()
}

/// Time the display words of `prepared` against the narration at `audio`.
///
/// Never fails: a transcriber error is logged and the uniform fallback used.
pub async fn align(
    transcriber: &dyn Transcriber,
    audio: &Path,
    scratch_dir: &Path,
    prepared: &PreparedText,
    rules: &AlignmentRules,
) -> Vec<TimedWord> {
    let speech_words: Vec<&str> = prepared.speech.split_whitespace().collect();

    let transcript = match transcriber.transcribe(audio, scratch_dir).await {
        Ok(words) if words.is_empty() => {
            warn!("Transcript is empty, using uniform word timing");
            None
        }
        Ok(words) => {
            if words.len() < speech_words.len() {
                debug!(
                    "Transcript has {} of {} words, extrapolating the rest",
                    words.len(),
                    speech_words.len()
                );
            }
            Some(words)
        }
        Err(e) => {
            warn!("Transcription failed, using uniform word timing: {e}");
            None
        }
    };

    let speech = time_speech_words(&speech_words, transcript.as_deref(), rules);
    collapse_to_display(&speech, prepared)
}


#[cfg(test)]
mod tests {
    use super::fake::ScriptedTranscriber;
    use super::*;

    fn strictly_increasing(words: &[TimedWord]) -> bool {
        words.windows(2).all(|w| w[0].start < w[1].start) && words.iter().all(|w| w.end > w.start)
    }

    #[test]
    fn uniform_fallback() {
        let timed = time_speech_words(&["a", "b", "c"], None, &AlignmentRules::default());
        assert!((timed[2].start - 1.2).abs() < 1e-9);
        assert!((timed[2].end - 1.8).abs() < 1e-9);
        assert!(strictly_increasing(&timed));
    }

    #[test]
    fn short_transcript_is_extrapolated() {
        let transcript = vec![TimedWord::new("a", 0.0, 0.4), TimedWord::new("b", 0.5, 1.0)];
        let timed = time_speech_words(
            &["a", "b", "c", "d"],
            Some(transcript.as_slice()),
            &AlignmentRules::default(),
        );
        assert!((timed[2].start - 1.1).abs() < 1e-9);
        assert!((timed[2].end - 1.6).abs() < 1e-9);
        assert!((timed[3].start - 1.7).abs() < 1e-9);
        assert_eq!(timed[3].text, "d");
    }

    #[test]
    fn transcript_text_is_ignored_in_favour_of_speech_words() {
        let transcript = vec![TimedWord::new("Hallo", 0.0, 0.3)];
        let timed = time_speech_words(
            &["Hello"],
            Some(transcript.as_slice()),
            &AlignmentRules::default(),
        );
        assert_eq!(timed[0].text, "Hello");
    }

    #[test]
    fn sanitize_repairs_overlaps_and_inversions() {
        let mut words = vec![
            TimedWord::new("a", 0.5, 0.4),
            TimedWord::new("b", 0.5, 0.9),
            TimedWord::new("c", 0.2, 0.3),
            TimedWord::new("d", -1.0, f64::NAN),
        ];
        sanitize(&mut words);
        assert!(strictly_increasing(&words));
    }

    #[test]
    fn collapse_spans_expanded_words() {
        let prepared = PreparedText::from_display("I'm 17M now".to_string());
        // I am seventeen M now
        let speech = vec![
            TimedWord::new("I", 0.0, 0.1),
            TimedWord::new("am", 0.2, 0.3),
            TimedWord::new("seventeen", 0.4, 0.8),
            TimedWord::new("M", 0.9, 1.0),
            TimedWord::new("now", 1.1, 1.4),
        ];
        let display = collapse_to_display(&speech, &prepared);
        assert_eq!(
            display,
            vec![
                TimedWord::new("I'm", 0.0, 0.3),
                TimedWord::new("17M", 0.4, 1.0),
                TimedWord::new("now", 1.1, 1.4),
            ]
        );
    }

    #[tokio::test]
    async fn failed_transcription_never_raises() {
        let prepared = PreparedText::from_display("one two three".to_string());
        let words = align(
            &ScriptedTranscriber::default(),
            Path::new("n.wav"),
            Path::new("."),
            &prepared,
            &AlignmentRules::default(),
        )
        .await;
        assert_eq!(words.len(), 3);
        assert!((words[1].start - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_transcript_uses_fallback() {
        let prepared = PreparedText::from_display("one two".to_string());
        let transcriber = ScriptedTranscriber {
            words: Some(Vec::new()),
        };
        let words = align(
            &transcriber,
            Path::new("n.wav"),
            Path::new("."),
            &prepared,
            &AlignmentRules::default(),
        )
        .await;
        assert!((words[1].end - 1.2).abs() < 1e-9);
    }
}
