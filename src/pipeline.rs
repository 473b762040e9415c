use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::{ImageModel, SpeechModel, TextModel};
use crate::narration::NarrationSynthesizer;
use crate::render::ImageRenderer;
use crate::story::Style;
use crate::storyline::StorylineGenerator;
use crate::video::{FinalVideo, VideoComposer};

/// Linear pipeline progression. Each transition is gated on the prior
/// stage's success; any failure is terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    StorylineReady,
    ImagesReady,
    AudioReady,
    VideoReady,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::StorylineReady => "storyline ready",
            Stage::ImagesReady => "images ready",
            Stage::AudioReady => "audio ready",
            Stage::VideoReady => "video ready",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs the four generation stages in order inside a fresh, uniquely
/// named working directory that is removed on every exit path. Model
/// handles are injected, not ambient. Not safe to run concurrently with
/// itself: the models share one accelerator on the provider side.
pub struct Pipeline<'a> {
    text: &'a dyn TextModel,
    image: &'a dyn ImageModel,
    speech: &'a dyn SpeechModel,
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        text: &'a dyn TextModel,
        image: &'a dyn ImageModel,
        speech: &'a dyn SpeechModel,
        config: &'a Config,
    ) -> Self {
        Self {
            text,
            image,
            speech,
            config,
        }
    }

    pub async fn run(&self, topic: &str, style: Style, output: &Path) -> Result<FinalVideo> {
        match self.run_stages(topic, style, output).await {
            Ok(video) => Ok(video),
            Err(e) => {
                warn!("Pipeline stage: {} (no resumption; next run restarts)", Stage::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(&self, topic: &str, style: Style, output: &Path) -> Result<FinalVideo> {
        let run_dir = tempfile::Builder::new()
            .prefix("studyreel-")
            .tempdir()
            .map_err(crate::error::Error::from)?;
        let mut stage = Stage::Idle;
        info!("Run directory: {}", run_dir.path().display());

        info!("Step 1/4: Generating storyline...");
        let storyline = StorylineGenerator::new(self.text)
            .generate(topic, style)
            .await?;
        stage = self.advance(stage, Stage::StorylineReady);

        info!("Step 2/4: Rendering {} images...", storyline.len());
        let images = ImageRenderer::new(self.image, self.config)
            .render(&storyline, run_dir.path())
            .await?;
        stage = self.advance(stage, Stage::ImagesReady);

        info!("Step 3/4: Synthesizing narration...");
        let clips = NarrationSynthesizer::new(self.speech, self.config)
            .synthesize(&storyline, run_dir.path())
            .await?;
        stage = self.advance(stage, Stage::AudioReady);

        info!("Step 4/4: Composing final video...");
        let video = VideoComposer::new(self.config)
            .compose(&images, &clips, run_dir.path(), output)
            .await?;
        self.advance(stage, Stage::VideoReady);

        Ok(video)
    }

    fn advance(&self, from: Stage, to: Stage) -> Stage {
        info!("Pipeline stage: {} -> {}", from, to);
        to
    }
}
