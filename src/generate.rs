//! One item from text to finished video.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::align::{self, AlignmentRules, Transcriber, WhisperTranscriber};
use crate::captions;
use crate::config::Config;
use crate::error::{ReelError, Result};
use crate::job::Job;
use crate::speech::{self, CommandSynthesizer, Synthesizer};
use crate::store::ContentItem;
use crate::text;
use crate::video::{self, CompositionPlan, Compositor, CropPlan, MediaToolkit};

/// The heavy collaborators, loaded on demand and released between items.
#[derive(Clone)]
pub struct Engines {
    pub synthesizer: Arc<dyn Synthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
}

impl Engines {
    #[must_use]
    pub fn new(synthesizer: Arc<dyn Synthesizer>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            synthesizer,
            transcriber,
        }
    }

    /// Command-line voice engine and whisper, as configured.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(CommandSynthesizer::new(&config.synthesis)),
            Arc::new(WhisperTranscriber::new(&config.alignment)),
        )
    }

    pub async fn warm(&self) -> Result<()> {
        self.synthesizer.warm().await?;
        self.transcriber.warm().await
    }

    pub async fn release(&self) {
        self.synthesizer.release().await;
        self.transcriber.release().await;
    }
}

/// Runs the generation pipeline for single items.
pub struct Generator<'a> {
    config: &'a Config,
    engines: &'a Engines,
    toolkit: &'a dyn MediaToolkit,
    rng: Mutex<StdRng>,
}

impl<'a> Generator<'a> {
    #[must_use]
    pub fn new(config: &'a Config, engines: &'a Engines, toolkit: &'a dyn MediaToolkit) -> Self {
        Self {
            config,
            engines,
            toolkit,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fix the background window choice, for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Produce the final video for `item` inside `job`.
    ///
    /// Intermediates are purged whatever the outcome; on success only the
    /// returned artifact remains.
    pub async fn generate(&self, item: &ContentItem, job: &Job) -> Result<PathBuf> {
        let result = self.run(item, job).await;
        job.purge_intermediates();
        match result {
            Ok(path) if path.exists() => Ok(path),
            Ok(path) => Err(ReelError::MissingArtifact(path)),
            Err(e) => {
                job.purge();
                Err(e)
            }
        }
    }

    async fn run(&self, item: &ContentItem, job: &Job) -> Result<PathBuf> {
        let config = self.config;
        let background = &config.paths.background_clip;
        if !background.exists() {
            return Err(ReelError::MissingBackground(background.clone()));
        }
        tokio::fs::create_dir_all(job.work_dir()).await?;

        let prepared = text::prepare(&item.title, &item.body, config.narration.narrate_title);
        if prepared.is_empty() {
            return Err(ReelError::Synthesis(format!(
                "{} has no narratable text",
                item.source_id
            )));
        }
        let chunks = text::chunk_speech(&prepared.speech, config.narration.chunk_chars);
        info!(
            "Generating {} (job {}): {} display / {} speech words, {} chunk(s)",
            item.source_id,
            job.id(),
            prepared.display_word_count(),
            prepared.speech_word_count(),
            chunks.len()
        );

        let (narration, audio_secs) =
            speech::synthesize_narration(self.engines.synthesizer.as_ref(), &chunks, job).await?;

        let words = align::align(
            self.engines.transcriber.as_ref(),
            &narration,
            job.work_dir(),
            &prepared,
            &AlignmentRules::from(&config.alignment),
        )
        .await;

        let clip = self.toolkit.probe(background).await?;
        let aspect = config.encoder.target_aspect;
        let crop = CropPlan::for_source(clip.width, clip.height, aspect);
        let frame = video::output_frame(clip.width, clip.height, aspect);

        captions::write_tracks(&words, &config.captions, frame, &job.srt(), &job.ass()).await?;

        let need = video::scene_need(
            prepared.speech_word_count(),
            config.narration.speaking_rate,
            config.narration.scene_buffer_secs,
            Some(audio_secs),
        );
        let window = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            video::select_window(clip.duration, need, &mut *rng)
        };
        if window.duration.is_none() {
            warn!(
                "Background clip ({:.1}s) is shorter than the {need:.1}s needed; using all of it",
                clip.duration
            );
        }

        let plan = CompositionPlan {
            frame: video::compositor::FrameSpec {
                background: background.clone(),
                narration,
                window,
                crop,
                output: job.framed_video(),
            },
            captions: job.ass(),
            speed_multiplier: config.narration.speed_multiplier,
            burned: job.burned_video(),
            title: item.title.clone(),
            comment: format!("From r/{}", item.collection),
            output: job.final_video(),
        };
        Compositor::new(self.toolkit, &config.encoder)
            .compose(&plan)
            .await
    }
}



#[cfg(test)]
mod tests {
    use super::fake::FakeToolkit;
    use super::test_support::{config_in, fake_engines};
    use super::*;
    use crate::store::record::sample_item;
    use crate::video::Stage;

    #[tokio::test]
    async fn produces_only_the_final_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let (engines, _) = fake_engines();
        let toolkit = FakeToolkit::landscape();
        let generator = Generator::new(&config, &engines, &toolkit).with_seed(3);
        let job = Job::new(&config.paths.work_dir);

        let path = generator
            .generate(&sample_item("g1", 900, 40), &job)
            .await
            .unwrap();

        assert_eq!(path, job.final_video());
        assert_eq!(job.files(), vec![job.final_video()]);
        assert_eq!(toolkit.stages(), vec![Stage::Frame, Stage::Burn, Stage::Finish]);

        let runs = toolkit.runs.lock().unwrap();
        let frame_args = &runs[0].1;
        assert!(frame_args.contains(&"crop=608:1080:656:0".to_string()));
        let burn_args = &runs[1].1;
        assert!(burn_args.iter().any(|a| a.contains("setpts=PTS/1.3")));
    }

    #[tokio::test]
    async fn failed_pass_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let (engines, _) = fake_engines();
        let toolkit = FakeToolkit::failing(Stage::Burn);
        let generator = Generator::new(&config, &engines, &toolkit);
        let job = Job::new(&config.paths.work_dir);

        let err = generator
            .generate(&sample_item("g2", 900, 40), &job)
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Ffmpeg(_)));
        assert!(job.files().is_empty());
        assert_eq!(toolkit.stages(), vec![Stage::Frame, Stage::Burn]);
    }

    #[tokio::test]
    async fn missing_background_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.paths.background_clip = dir.path().join("gone.mp4");
        let (engines, synth) = fake_engines();
        let toolkit = FakeToolkit::landscape();
        let generator = Generator::new(&config, &engines, &toolkit);

        let err = generator
            .generate(&sample_item("g3", 900, 40), &Job::new(&config.paths.work_dir))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(synth.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_body_fails_before_synthesis() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.narration.narrate_title = false;
        let (engines, _) = fake_engines();
        let toolkit = FakeToolkit::landscape();
        let generator = Generator::new(&config, &engines, &toolkit);
        let mut item = sample_item("g4", 900, 0);
        item.body = "Edit: nothing to see".to_string();

        let err = generator
            .generate(&item, &Job::new(&config.paths.work_dir))
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Synthesis(_)));
        assert!(toolkit.stages().is_empty());
    }
}
