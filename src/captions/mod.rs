//! Caption composition: timed words in, SRT and styled ASS tracks out.

pub mod phrase;
pub mod subtitle;

use std::path::Path;

use crate::config::CaptionConfig;
use crate::error::Result;

pub use phrase::{close_gaps, group_phrases, Phrase, PhraseRules, TimedWord};
pub use subtitle::{
    parse_srt, write_track, AssGenerator, SrtGenerator, SubtitleEntry, SubtitleFormat,
    SubtitleGenerator, SubtitleStyle,
};

impl From<&CaptionConfig> for PhraseRules {
    fn from(config: &CaptionConfig) -> Self {
        Self {
            min_words: config.min_words,
            max_words: config.max_words,
            break_punctuation: config.break_punctuation.chars().collect(),
        }
    }
}

/// Group `words` into phrases and write both caption tracks.
///
/// The SRT is written first and read back to build the ASS track, which
/// is laid out for a `width` x `height` frame with the style
/// scaled to that height.
pub async fn write_tracks(
    words: &[TimedWord],
    config: &CaptionConfig,
    (width, height): (u32, u32),
    srt_path: &Path,
    ass_path: &Path,
) -> Result<Vec<Phrase>> {
    let phrases = group_phrases(words, &PhraseRules::from(config));
    let entries: Vec<SubtitleEntry> = phrases.iter().map(SubtitleEntry::from_phrase).collect();

    write_track(&SrtGenerator, &entries, srt_path).await?;

    // the burned track is rendered from the SRT as written
    let written = parse_srt(&tokio::fs::read_to_string(srt_path).await?)?;
    let ass = AssGenerator::new()
        .with_resolution(width, height)
        .with_style(SubtitleStyle::scaled(config, height));
    write_track(&ass, &written, ass_path).await?;

    tracing::info!("Captions: {} word(s) in {} phrase(s)", words.len(), phrases.len());
    Ok(phrases)
}
