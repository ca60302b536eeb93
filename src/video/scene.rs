//! Background window selection.

use rand::Rng;

/// A contiguous slice of the background clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneWindow {
    /// Offset into the clip, seconds
    pub start: f64,
    /// Window length; `None` uses the clip to its end
    pub duration: Option<f64>,
}

/// Seconds of background needed for a narration.
///
/// The word estimate is used until the narration is measured; a measured
/// duration only ever lengthens the window.
#[must_use]
pub fn scene_need(
    speech_words: usize,
    speaking_rate: f64,
    buffer_secs: f64,
    measured: Option<f64>,
) -> f64 {
    let estimate = crate::text::estimate_narration_secs(speech_words, speaking_rate);
    let narration = measured.map_or(estimate, |m| m.max(estimate));
    narration + buffer_secs.max(0.0)
}

/// Pick a window of `need` seconds from a clip of `clip_duration` seconds.
///
/// A clip no longer than the need is used whole from offset zero; the
/// `-shortest` mux then trims to whichever stream ends first.
pub fn select_window<R: Rng + ?Sized>(clip_duration: f64, need: f64, rng: &mut R) -> SceneWindow {
    if clip_duration <= need {
        return SceneWindow {
            start: 0.0,
            duration: None,
        };
    }
    let latest = clip_duration - need;
    SceneWindow {
        start: rng.gen_range(0.0..=latest),
        duration: Some(need),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn short_clip_is_used_whole() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = select_window(40.0, 60.0, &mut rng);
        assert_eq!(w, SceneWindow { start: 0.0, duration: None });
        let w = select_window(60.0, 60.0, &mut rng);
        assert!(w.duration.is_none());
    }

    #[test]
    fn window_fits_inside_clip() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let w = select_window(600.0, 75.0, &mut rng);
            assert!(w.start >= 0.0);
            assert!(w.start + w.duration.unwrap() <= 600.0 + 1e-9);
            assert!((w.duration.unwrap() - 75.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let a = select_window(600.0, 75.0, &mut StdRng::seed_from_u64(1));
        let b = select_window(600.0, 75.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn need_prefers_longer_measurement() {
        // 100 words at 2.5 w/s = 40 s, plus 5 s buffer
        assert!((scene_need(100, 2.5, 5.0, None) - 45.0).abs() < 1e-9);
        assert!((scene_need(100, 2.5, 5.0, Some(52.0)) - 57.0).abs() < 1e-9);
        assert!((scene_need(100, 2.5, 5.0, Some(30.0)) - 45.0).abs() < 1e-9);
    }
}
