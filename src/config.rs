//! Configuration loaded from `~/.config/storyreel/config.toml`.
//!
//! One [`Config`] value is built at startup and passed by reference to every
//! stage. Every section falls back to defaults, so an absent file is valid.
//!
//! ```toml
//! [narration]
//! speaking_rate = 2.5
//! speed_multiplier = 1.3
//!
//! [batch]
//! items_per_batch = 5
//! trigger_times = ["17:00", "21:00"]
//!
//! [paths]
//! background_clip = "/srv/media/parkour.mp4"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub narration: NarrationConfig,
    pub captions: CaptionConfig,
    pub alignment: AlignmentConfig,
    pub synthesis: SynthesisConfig,
    pub encoder: EncoderConfig,
    pub batch: BatchConfig,
    pub publish: PublishConfig,
    pub paths: PathsConfig,
}

/// Speaking pace and narration shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Words per second of the synthesized voice
    pub speaking_rate: f64,
    /// Post-production speed-up applied to video and audio together
    pub speed_multiplier: f64,
    /// Read the title before the body
    pub narrate_title: bool,
    /// Character budget per synthesis chunk
    pub chunk_chars: usize,
    /// Extra background seconds beyond the narration estimate
    pub scene_buffer_secs: f64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            speaking_rate: 2.5,
            speed_multiplier: 1.3,
            narrate_title: true,
            chunk_chars: 90,
            scene_buffer_secs: 5.0,
        }
    }
}

/// Caption grouping and styling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub min_words: usize,
    pub max_words: usize,
    /// A phrase may end early after a word ending in one of these
    pub break_punctuation: String,
    pub font_name: String,
    /// Output height at which the base sizes apply
    pub reference_height: u32,
    pub base_font_size: u32,
    pub base_outline: u32,
    pub base_shadow: u32,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            min_words: 2,
            max_words: 3,
            break_punctuation: ".!?,;:".to_string(),
            font_name: "Arial".to_string(),
            reference_height: 854,
            base_font_size: 36,
            base_outline: 3,
            base_shadow: 2,
        }
    }
}

/// Word timing extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Path to whisper executable (or "whisper" for PATH lookup)
    pub whisper_path: String,
    /// Whisper model size (tiny, base, small, medium, large)
    pub model: String,
    pub language: String,
    /// Gap inserted before each extrapolated word
    pub extrapolate_gap_secs: f64,
    /// Length of each extrapolated word
    pub extrapolate_word_secs: f64,
    /// Per-word duration when transcription fails entirely
    pub fallback_word_secs: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            whisper_path: "whisper".to_string(),
            model: "tiny".to_string(),
            language: "en".to_string(),
            extrapolate_gap_secs: 0.1,
            extrapolate_word_secs: 0.5,
            fallback_word_secs: 0.6,
        }
    }
}

/// External voice engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Voice engine binary; receives the chunk text on stdin
    pub program: String,
    /// Arguments; `{output}` is replaced by the chunk WAV path
    pub args: Vec<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            program: "piper".to_string(),
            args: vec![
                "--model".to_string(),
                "en_US-ryan-high.onnx".to_string(),
                "--output_file".to_string(),
                "{output}".to_string(),
            ],
        }
    }
}

/// Encoder knobs shared by every video pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub max_bitrate: String,
    pub buffer_size: String,
    pub frame_rate: u32,
    pub pixel_format: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Output aspect ratio as (width, height)
    pub target_aspect: (u32, u32),
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: find_binary("ffmpeg"),
            ffprobe_path: find_binary("ffprobe"),
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            max_bitrate: "4M".to_string(),
            buffer_size: "4M".to_string(),
            frame_rate: 30,
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
            target_aspect: (9, 16),
        }
    }
}

/// How each selected item is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Isolation {
    /// Engines stay loaded across items and are released after each one
    #[default]
    InProcess,
    /// Each item runs in a fresh child process
    Subprocess,
}

/// Selection and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub items_per_batch: usize,
    pub min_score: i64,
    /// Longest acceptable estimated output duration, in seconds
    pub max_item_secs: f64,
    /// Local wall-clock times, `HH:MM`
    pub trigger_times: Vec<String>,
    pub isolation: Isolation,
    /// Stop re-selecting an item after this many generation attempts
    pub max_attempts: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            items_per_batch: 5,
            min_score: 500,
            max_item_secs: 90.0,
            trigger_times: vec!["17:00".to_string(), "21:00".to_string()],
            isolation: Isolation::InProcess,
            max_attempts: None,
        }
    }
}

impl BatchConfig {
    /// Parse the configured trigger times.
    pub fn parsed_trigger_times(&self) -> Result<Vec<NaiveTime>> {
        self.trigger_times
            .iter()
            .map(|t| {
                NaiveTime::parse_from_str(t, "%H:%M")
                    .map_err(|e| ReelError::Config(format!("invalid trigger time '{t}': {e}")))
            })
            .collect()
    }
}

/// Publish metadata and uploader invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Uploader binary; receives the request JSON on stdin
    pub program: String,
    pub args: Vec<String>,
    pub title_suffix: String,
    pub category_id: String,
    pub visibility: String,
    pub default_tags: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            program: "storyreel-upload".to_string(),
            args: Vec::new(),
            title_suffix: " #shorts".to_string(),
            category_id: "24".to_string(),
            visibility: "public".to_string(),
            default_tags: vec!["shorts".to_string(), "reddit".to_string(), "story".to_string()],
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// JSON record store
    pub store: PathBuf,
    /// Directory for job-scoped intermediate files
    pub work_dir: PathBuf,
    pub background_clip: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storyreel");
        Self {
            store: data.join("items.json"),
            work_dir: std::env::temp_dir().join("storyreel"),
            background_clip: data.join("background.mp4"),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file at the default location yields defaults; an explicit
    /// path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let p = config_path();
                if p.exists() {
                    Self::from_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReelError::Config(format!("failed to read {}: {e}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let n = &self.narration;
        if n.speaking_rate <= 0.0 {
            return Err(ReelError::Config("speaking_rate must be positive".into()));
        }
        if n.speed_multiplier <= 0.0 {
            return Err(ReelError::Config("speed_multiplier must be positive".into()));
        }
        if n.chunk_chars == 0 {
            return Err(ReelError::Config("chunk_chars must be positive".into()));
        }
        let c = &self.captions;
        if c.min_words == 0 || c.min_words > c.max_words {
            return Err(ReelError::Config(format!(
                "caption word bounds invalid: min {} max {}",
                c.min_words, c.max_words
            )));
        }
        if c.reference_height == 0 {
            return Err(ReelError::Config("reference_height must be positive".into()));
        }
        let (w, h) = self.encoder.target_aspect;
        if w == 0 || h == 0 {
            return Err(ReelError::Config("target_aspect must be non-zero".into()));
        }
        self.batch.parsed_trigger_times()?;
        Ok(())
    }
}

/// Return the path to the default config file.
#[must_use]
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storyreel")
        .join("config.toml")
}

fn find_binary(name: &str) -> String {
    which::which(name).map_or_else(|_| name.to_string(), |p| p.to_string_lossy().to_string())
}
