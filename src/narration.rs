use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::SpeechModel;
use crate::story::{NarrationClip, Storyline};

/// Synthesizes one narration clip per frame, persisted as 16-bit mono WAV.
pub struct NarrationSynthesizer<'a> {
    model: &'a dyn SpeechModel,
    config: &'a Config,
}

impl<'a> NarrationSynthesizer<'a> {
    pub fn new(model: &'a dyn SpeechModel, config: &'a Config) -> Self {
        Self { model, config }
    }

    pub async fn synthesize(
        &self,
        storyline: &Storyline,
        run_dir: &Path,
    ) -> Result<Vec<NarrationClip>> {
        let mut clips = Vec::with_capacity(storyline.len());

        for frame in storyline.frames() {
            let samples = self.model.synthesize(&frame.narration).await?;
            if samples.is_empty() {
                return Err(Error::Model(format!(
                    "speech model returned an empty waveform for frame {}",
                    frame.index
                )));
            }

            let path = run_dir.join(self.config.speech_filename(frame.index));
            write_wav(&path, &samples, self.config.sample_rate)?;

            let duration = samples.len() as f64 / f64::from(self.config.sample_rate);
            info!(
                "Synthesized clip {}/{}: {:.2}s",
                frame.index + 1,
                storyline.len(),
                duration
            );
            clips.push(NarrationClip {
                index: frame.index,
                path,
                duration,
            });
        }

        Ok(clips)
    }
}

fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(quantized)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::Frame;
    use async_trait::async_trait;

    struct StubSpeech {
        seconds: f64,
    }

    #[async_trait]
    impl SpeechModel for StubSpeech {
        async fn synthesize(&self, _text: &str) -> Result<Vec<f32>> {
            let n = (self.seconds * 16_000.0) as usize;
            Ok(vec![0.1; n])
        }
    }

    fn storyline(n: usize) -> Storyline {
        Storyline::new(
            (0..n)
                .map(|index| Frame {
                    index,
                    image_prompt: format!("prompt {index}"),
                    narration: format!("narration {index}"),
                })
                .collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn one_clip_per_frame_with_positive_duration() {
        let model = StubSpeech { seconds: 1.5 };
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();

        let clips = NarrationSynthesizer::new(&model, &config)
            .synthesize(&storyline(3), dir.path())
            .await
            .unwrap();

        assert_eq!(clips.len(), 3);
        for (i, clip) in clips.iter().enumerate() {
            assert_eq!(clip.index, i);
            assert!(clip.duration > 0.0);
            assert!((clip.duration - 1.5).abs() < 1e-6);
            assert!(clip.path.exists());
        }
    }

    #[tokio::test]
    async fn persisted_wav_round_trips_duration() {
        let model = StubSpeech { seconds: 0.25 };
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();

        let clips = NarrationSynthesizer::new(&model, &config)
            .synthesize(&storyline(1), dir.path())
            .await
            .unwrap();

        let reader = hound::WavReader::open(&clips[0].path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.channels, 1);
        let duration = f64::from(reader.duration()) / f64::from(spec.sample_rate);
        assert!((duration - 0.25).abs() < 1e-6);
    }

    #[tokio::test]
    async fn empty_waveform_is_a_model_failure() {
        let model = StubSpeech { seconds: 0.0 };
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();

        let result = NarrationSynthesizer::new(&model, &config)
            .synthesize(&storyline(1), dir.path())
            .await;
        assert!(matches!(result, Err(Error::Model(_))));
    }
}
