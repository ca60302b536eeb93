//! ffprobe output parsing.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ReelError, Result};

/// What the composer needs to know about the background clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    /// Seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// `FFprobe` JSON output structure
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: String,
}

/// Arguments for a JSON probe of `path`.
#[must_use]
pub fn probe_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "quiet".to_string(),
        "-print_format".to_string(),
        "json".to_string(),
        "-show_format".to_string(),
        "-show_streams".to_string(),
        path.to_string_lossy().to_string(),
    ]
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
///
/// Container duration wins; the video stream's duration is the fallback.
pub fn parse_probe(json: &[u8]) -> Result<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::Ffmpeg("no video stream found".to_string()))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(ReelError::Ffmpeg("video stream has no dimensions".to_string())),
    };

    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.parse::<f64>().ok())
        .or_else(|| video.duration.as_ref().and_then(|d| d.parse().ok()))
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ReelError::Ffmpeg("clip duration unknown".to_string()))?;

    Ok(VideoInfo {
        duration,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_landscape_clip() {
        let json = br#"{
            "streams": [
                {"codec_type": "audio", "channels": 2},
                {"codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30/1"}
            ],
            "format": {"duration": "612.480000", "format_name": "mov,mp4"}
        }"#;
        let info = parse_probe(json).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
        assert!((info.duration - 612.48).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_stream_duration() {
        let json = br#"{
            "streams": [{"codec_type": "video", "width": 720, "height": 1280, "duration": "30.5"}],
            "format": {}
        }"#;
        assert!((parse_probe(json).unwrap().duration - 30.5).abs() < 1e-9);
    }

    #[test]
    fn audio_only_is_rejected() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        assert!(matches!(parse_probe(json), Err(ReelError::Ffmpeg(_))));
    }

    #[test]
    fn args_end_with_path() {
        let args = probe_args(Path::new("/tmp/bg.mp4"));
        assert_eq!(args.last().unwrap(), "/tmp/bg.mp4");
        assert!(args.contains(&"-show_streams".to_string()));
    }
}
