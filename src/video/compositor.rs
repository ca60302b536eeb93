//! The three ffmpeg passes that turn a background window, a narration track
//! and a caption track into the final vertical video.
//!
//! Argument lists are built by pure functions so they can be inspected in
//! tests; [`Compositor`] runs them through a [`MediaToolkit`] in order and
//! removes intermediates as soon as the next pass no longer needs them.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::scene::SceneWindow;
use super::MediaToolkit;
use crate::config::EncoderConfig;
use crate::error::Result;
use crate::job::remove_quietly;

/// Named ffmpeg pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Seek, optional crop, mux narration over the muted background
    Frame,
    /// Burn captions and apply the speed multiplier
    Burn,
    /// Metadata-only rewrite with faststart
    Finish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Frame => "frame",
            Self::Burn => "burn",
            Self::Finish => "finish",
        })
    }
}

/// Centre crop of a wider-than-target frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CropPlan {
    /// Crop needed to bring a `width` x `height` source to `aspect`
    /// (width, height), or `None` when the source is not wider than that.
    ///
    /// The full height is kept; the width is rounded and clamped to the
    /// source.
    #[must_use]
    pub fn for_source(width: u32, height: u32, aspect: (u32, u32)) -> Option<Self> {
        let (aw, ah) = aspect;
        if aw == 0 || ah == 0 || height == 0 {
            return None;
        }
        // width / height > aw / ah, without floats
        if u64::from(width) * u64::from(ah) <= u64::from(height) * u64::from(aw) {
            return None;
        }
        let crop_width = (f64::from(height) * f64::from(aw) / f64::from(ah)).round() as u32;
        let crop_width = crop_width.clamp(1, width);
        Some(Self {
            width: crop_width,
            height,
            x: (width - crop_width) / 2,
            y: 0,
        })
    }

    #[must_use]
    pub fn filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

/// Output frame for a source, after any crop.
#[must_use]
pub fn output_frame(width: u32, height: u32, aspect: (u32, u32)) -> (u32, u32) {
    CropPlan::for_source(width, height, aspect).map_or((width, height), |c| (c.width, c.height))
}

/// Split a tempo factor into `atempo` stages, each within [0.5, 2.0],
/// whose product is the factor.
#[must_use]
pub fn tempo_chain(factor: f64) -> Vec<f64> {
    if !factor.is_finite() || factor <= 0.0 {
        return Vec::new();
    }
    let mut remaining = factor;
    let mut chain = Vec::new();
    while remaining > 2.0 {
        chain.push(2.0);
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        chain.push(0.5);
        remaining /= 0.5;
    }
    chain.push(remaining);
    chain
}

fn is_unit_speed(multiplier: f64) -> bool {
    (multiplier - 1.0).abs() < 1e-6
}

/// Inputs of the frame pass
#[derive(Debug, Clone)]
pub struct FrameSpec {
    pub background: PathBuf,
    pub narration: PathBuf,
    pub window: SceneWindow,
    pub crop: Option<CropPlan>,
    pub output: PathBuf,
}

/// Inputs of the burn pass
#[derive(Debug, Clone)]
pub struct BurnSpec {
    pub input: PathBuf,
    pub captions: PathBuf,
    pub speed_multiplier: f64,
    pub output: PathBuf,
}

/// Inputs of the finish pass
#[derive(Debug, Clone)]
pub struct FinishSpec {
    pub input: PathBuf,
    pub title: String,
    pub comment: String,
    pub output: PathBuf,
}

fn push(args: &mut Vec<String>, items: &[&str]) {
    args.extend(items.iter().map(|s| (*s).to_string()));
}

fn base_args() -> Vec<String> {
    let mut args = Vec::new();
    push(&mut args, &["-y", "-hide_banner", "-loglevel", "error"]);
    args
}

/// Re-encode settings shared by every pass that touches pixels.
fn video_encode_args(args: &mut Vec<String>, encoder: &EncoderConfig) {
    push(args, &["-c:v", &encoder.video_codec]);
    push(args, &["-preset", &encoder.preset]);
    push(args, &["-crf", &encoder.crf.to_string()]);
    push(args, &["-maxrate", &encoder.max_bitrate]);
    push(args, &["-bufsize", &encoder.buffer_size]);
    push(args, &["-r", &encoder.frame_rate.to_string()]);
    push(args, &["-pix_fmt", &encoder.pixel_format]);
    push(args, &["-profile:v", "high", "-level", "4.0"]);
}

fn audio_encode_args(args: &mut Vec<String>, encoder: &EncoderConfig) {
    push(args, &["-c:a", &encoder.audio_codec, "-b:a", &encoder.audio_bitrate]);
}

fn strip_metadata_args(args: &mut Vec<String>) {
    push(args, &["-map_metadata", "-1", "-fflags", "+bitexact"]);
}

/// Escape a path for use inside a filtergraph `ass='...'` argument.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Frame pass: background window with narration audio.
///
/// The video is stream-copied unless a crop is needed, in which case crop
/// and mux happen in the same invocation.
#[must_use]
pub fn frame_args(spec: &FrameSpec, encoder: &EncoderConfig) -> Vec<String> {
    let mut args = base_args();
    push(&mut args, &["-ss", &format!("{:.3}", spec.window.start)]);
    push(&mut args, &["-i", &spec.background.to_string_lossy()]);
    push(&mut args, &["-i", &spec.narration.to_string_lossy()]);
    if let Some(duration) = spec.window.duration {
        push(&mut args, &["-t", &format!("{duration:.3}")]);
    }
    push(&mut args, &["-map", "0:v:0", "-map", "1:a:0"]);
    match spec.crop {
        Some(crop) => {
            push(&mut args, &["-vf", &crop.filter()]);
            video_encode_args(&mut args, encoder);
        }
        None => push(&mut args, &["-c:v", "copy"]),
    }
    audio_encode_args(&mut args, encoder);
    push(&mut args, &["-shortest"]);
    strip_metadata_args(&mut args);
    args.push(spec.output.to_string_lossy().to_string());
    args
}

/// Burn pass: captions and speed change in one re-encode.
#[must_use]
pub fn burn_args(spec: &BurnSpec, encoder: &EncoderConfig) -> Vec<String> {
    let unit = is_unit_speed(spec.speed_multiplier);
    let mut filter = format!("ass='{}'", escape_filter_path(&spec.captions));
    if !unit {
        filter.push_str(&format!(",setpts=PTS/{}", spec.speed_multiplier));
    }

    let mut args = base_args();
    push(&mut args, &["-i", &spec.input.to_string_lossy()]);
    push(&mut args, &["-vf", &filter]);
    video_encode_args(&mut args, encoder);
    if unit {
        push(&mut args, &["-c:a", "copy"]);
    } else {
        let atempo = tempo_chain(spec.speed_multiplier)
            .iter()
            .map(|t| format!("atempo={t}"))
            .collect::<Vec<_>>()
            .join(",");
        push(&mut args, &["-af", &atempo]);
        audio_encode_args(&mut args, encoder);
    }
    strip_metadata_args(&mut args);
    args.push(spec.output.to_string_lossy().to_string());
    args
}

/// Finish pass: stream copy, fresh metadata, moov atom up front.
#[must_use]
pub fn finish_args(spec: &FinishSpec) -> Vec<String> {
    let mut args = base_args();
    push(&mut args, &["-i", &spec.input.to_string_lossy()]);
    push(&mut args, &["-map", "0", "-c", "copy"]);
    strip_metadata_args(&mut args);
    push(&mut args, &["-metadata", &format!("title={}", spec.title)]);
    push(&mut args, &["-metadata", &format!("comment={}", spec.comment)]);
    push(&mut args, &["-movflags", "+faststart"]);
    args.push(spec.output.to_string_lossy().to_string());
    args
}

/// Everything the three passes need for one job.
#[derive(Debug, Clone)]
pub struct CompositionPlan {
    pub frame: FrameSpec,
    pub captions: PathBuf,
    pub speed_multiplier: f64,
    pub burned: PathBuf,
    pub title: String,
    pub comment: String,
    pub output: PathBuf,
}

/// Runs the passes in order through a toolkit.
pub struct Compositor<'a> {
    toolkit: &'a dyn MediaToolkit,
    encoder: &'a EncoderConfig,
}

impl<'a> Compositor<'a> {
    #[must_use]
    pub fn new(toolkit: &'a dyn MediaToolkit, encoder: &'a EncoderConfig) -> Self {
        Self { toolkit, encoder }
    }

    /// Run frame, burn and finish. Returns the final artifact path.
    ///
    /// A failed pass deletes its partial output and stops the chain.
    pub async fn compose(&self, plan: &CompositionPlan) -> Result<PathBuf> {
        self.run(Stage::Frame, frame_args(&plan.frame, self.encoder), &plan.frame.output)
            .await?;

        let burn = BurnSpec {
            input: plan.frame.output.clone(),
            captions: plan.captions.clone(),
            speed_multiplier: plan.speed_multiplier,
            output: plan.burned.clone(),
        };
        self.run(Stage::Burn, burn_args(&burn, self.encoder), &burn.output)
            .await?;
        remove_quietly(&plan.frame.output).await;

        let finish = FinishSpec {
            input: plan.burned.clone(),
            title: plan.title.clone(),
            comment: plan.comment.clone(),
            output: plan.output.clone(),
        };
        self.run(Stage::Finish, finish_args(&finish), &finish.output)
            .await?;
        remove_quietly(&plan.burned).await;

        info!("Composed {}", plan.output.display());
        Ok(plan.output.clone())
    }

    async fn run(&self, stage: Stage, args: Vec<String>, output: &Path) -> Result<()> {
        debug!("ffmpeg {stage}: {}", args.join(" "));
        if let Err(e) = self.toolkit.run(stage, &args).await {
            remove_quietly(output).await;
            return Err(e);
        }
        Ok(())
    }
}
