//! SRT and ASS track generation.
//!
//! SRT is the plain intermediate track; ASS carries the burned-in styling.

use std::fmt::Write as FmtWrite;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use super::phrase::Phrase;
use crate::config::CaptionConfig;
use crate::error::{ReelError, Result};

/// Subtitle format type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtitleFormat {
    /// `SubRip` (.srt)
    #[default]
    Srt,
    /// Advanced `SubStation` Alpha (.ass)
    Ass,
}

impl SubtitleFormat {
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Ass => "ass",
        }
    }
}

/// A single subtitle entry with timing and text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Start time in milliseconds
    pub start_ms: u64,
    /// End time in milliseconds
    pub end_ms: u64,
    pub text: String,
}

impl SubtitleEntry {
    #[must_use]
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Convert a phrase, rounding seconds to the nearest millisecond
    #[must_use]
    pub fn from_phrase(phrase: &Phrase) -> Self {
        Self::new(secs_to_ms(phrase.start), secs_to_ms(phrase.end), &phrase.text)
    }

    /// Format time as SRT timestamp (HH:MM:SS,mmm)
    fn format_srt_time(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1000;
        let millis = ms % 1000;
        format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
    }

    /// Format time as ASS timestamp (H:MM:SS.cc)
    fn format_ass_time(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1000;
        let centis = (ms % 1000) / 10;
        format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

/// Style configuration for ASS subtitles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    /// Primary color (AABBGGRR format for ASS)
    pub primary_color: String,
    pub secondary_color: String,
    pub outline_color: String,
    /// Background/shadow color
    pub back_color: String,
    pub bold: bool,
    /// Horizontal stretch, percent
    pub scale_x: u32,
    pub scale_y: u32,
    pub outline: u32,
    pub shadow: u32,
    /// Alignment (numpad style: 1-9)
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            font_name: "Arial".to_string(),
            font_size: 36,
            primary_color: "&H00FFFFFF".to_string(), // White
            secondary_color: "&H00FFFFFF".to_string(),
            outline_color: "&H00000000".to_string(), // Black
            back_color: "&H00000000".to_string(),
            bold: true,
            scale_x: 105,
            scale_y: 100,
            outline: 3,
            shadow: 2,
            alignment: 5, // Middle center
            margin_l: 10,
            margin_r: 10,
            margin_v: 20,
        }
    }
}

impl SubtitleStyle {
    /// Caption style for a frame `height` pixels tall.
    ///
    /// Font size, outline and shadow grow linearly with height relative to
    /// the configured reference height.
    #[must_use]
    pub fn scaled(config: &CaptionConfig, height: u32) -> Self {
        let factor = f64::from(height) / f64::from(config.reference_height.max(1));
        let scale = |base: u32| ((f64::from(base) * factor) as u32).max(1);
        Self {
            font_name: config.font_name.clone(),
            font_size: scale(config.base_font_size),
            outline: scale(config.base_outline),
            shadow: scale(config.base_shadow),
            ..Self::default()
        }
    }

    /// Format as ASS style line
    fn to_ass_line(&self) -> String {
        format!(
            "Style: {},{},{},{},{},{},{},{},0,0,0,{},{},0,0,1,{},{},{},{},{},{},1",
            self.name,
            self.font_name,
            self.font_size,
            self.primary_color,
            self.secondary_color,
            self.outline_color,
            self.back_color,
            if self.bold { -1 } else { 0 },
            self.scale_x,
            self.scale_y,
            self.outline,
            self.shadow,
            self.alignment,
            self.margin_l,
            self.margin_r,
            self.margin_v
        )
    }
}

/// Trait for subtitle generators
pub trait SubtitleGenerator: Send + Sync {
    fn format(&self) -> SubtitleFormat;

    /// Generate subtitle content from entries
    fn generate(&self, entries: &[SubtitleEntry]) -> Result<String>;
}

/// Render `entries` with `generator` and write the result to `path`.
pub async fn write_track(
    generator: &dyn SubtitleGenerator,
    entries: &[SubtitleEntry],
    path: &Path,
) -> Result<()> {
    let content = generator.generate(entries)?;
    fs::write(path, content).await?;
    tracing::debug!(
        "Wrote {} {} cue(s) to {}",
        entries.len(),
        generator.format().extension(),
        path.display()
    );
    Ok(())
}

/// SRT subtitle generator
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtGenerator;

impl SubtitleGenerator for SrtGenerator {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Srt
    }

    fn generate(&self, entries: &[SubtitleEntry]) -> Result<String> {
        let mut output = String::new();

        for (i, entry) in entries.iter().enumerate() {
            writeln!(output, "{}", i + 1)?;
            writeln!(
                output,
                "{} --> {}",
                SubtitleEntry::format_srt_time(entry.start_ms),
                SubtitleEntry::format_srt_time(entry.end_ms)
            )?;
            writeln!(output, "{}", entry.text)?;
            writeln!(output)?;
        }

        Ok(output)
    }
}

/// ASS subtitle generator with a single caption style
#[derive(Debug, Clone)]
pub struct AssGenerator {
    /// Output frame width
    pub play_res_x: u32,
    /// Output frame height
    pub play_res_y: u32,
    pub style: SubtitleStyle,
    pub title: String,
}

impl Default for AssGenerator {
    fn default() -> Self {
        Self {
            play_res_x: 1080,
            play_res_y: 1920,
            style: SubtitleStyle::default(),
            title: "storyreel captions".to_string(),
        }
    }
}

impl AssGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame the captions are rendered onto
    #[must_use]
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.play_res_x = width;
        self.play_res_y = height;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: SubtitleStyle) -> Self {
        self.style = style;
        self
    }

    fn write_header(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "[Script Info]")?;
        writeln!(out, "Title: {}", self.title)?;
        writeln!(out, "ScriptType: v4.00+")?;
        writeln!(out, "PlayResX: {}", self.play_res_x)?;
        writeln!(out, "PlayResY: {}", self.play_res_y)?;
        writeln!(out, "WrapStyle: 0")?;
        writeln!(out, "ScaledBorderAndShadow: yes")?;
        writeln!(out)?;

        writeln!(out, "[V4+ Styles]")?;
        writeln!(
            out,
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
             OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, \
             ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, \
             MarginL, MarginR, MarginV, Encoding"
        )?;
        writeln!(out, "{}", self.style.to_ass_line())?;
        writeln!(out)?;

        writeln!(out, "[Events]")?;
        writeln!(
            out,
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
        )
    }
}

impl SubtitleGenerator for AssGenerator {
    fn format(&self) -> SubtitleFormat {
        SubtitleFormat::Ass
    }

    fn generate(&self, entries: &[SubtitleEntry]) -> Result<String> {
        let mut output = String::new();
        self.write_header(&mut output)?;

        for entry in entries {
            let text = entry
                .text
                .replace('\\', "\\\\")
                .replace('{', "\\{")
                .replace('}', "\\}")
                .replace('\n', "\\N");

            writeln!(
                output,
                "Dialogue: 0,{},{},{},,0,0,0,,{}",
                SubtitleEntry::format_ass_time(entry.start_ms),
                SubtitleEntry::format_ass_time(entry.end_ms),
                self.style.name,
                text
            )?;
        }

        Ok(output)
    }
}

/// Parse SRT file content into subtitle entries
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();

    while lines.peek().is_some() {
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        let Some(seq_line) = lines.next() else {
            break;
        };
        if seq_line.trim().parse::<u32>().is_err() {
            continue;
        }

        let Some(time_line) = lines.next() else {
            break;
        };
        let (start_ms, end_ms) = parse_srt_timestamp_line(time_line)?;

        let mut text_lines = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            text_lines.push(line);
        }

        entries.push(SubtitleEntry::new(start_ms, end_ms, text_lines.join("\n")));
    }

    Ok(entries)
}

/// Parse "HH:MM:SS,mmm --> HH:MM:SS,mmm"
fn parse_srt_timestamp_line(line: &str) -> Result<(u64, u64)> {
    let (start, end) = line
        .split_once("-->")
        .ok_or_else(|| ReelError::Subtitle(format!("invalid SRT timestamp line: {line}")))?;
    Ok((parse_srt_timestamp(start.trim())?, parse_srt_timestamp(end.trim())?))
}

/// Parse "HH:MM:SS,mmm" to milliseconds
fn parse_srt_timestamp(ts: &str) -> Result<u64> {
    let invalid = || ReelError::Subtitle(format!("invalid SRT timestamp: {ts}"));
    let parts: Vec<&str> = ts.split([',', ':']).collect();
    if parts.len() != 4 {
        return Err(invalid());
    }
    let mut fields = [0u64; 4];
    for (field, part) in fields.iter_mut().zip(&parts) {
        *field = part.parse().map_err(|_| invalid())?;
    }
    let [hours, minutes, seconds, millis] = fields;
    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1000 + millis)
}
