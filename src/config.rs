use std::time::Duration;

/// Bounded retry for outbound model calls. Retries cover transport and
/// HTTP-status failures only, never parse failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Tunable parameters for every pipeline stage. Defaults reproduce the
/// reference behavior; nothing here is read from ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory name for rendered images inside the run directory.
    pub image_dir: String,
    /// Filename stem for rendered images, suffixed with the frame index.
    pub image_stem: String,
    /// Filename stem for narration clips, suffixed with the frame index.
    pub speech_stem: String,

    // Image model inference parameters.
    pub inference_steps: u32,
    pub guidance_scale: f64,
    pub seed: u64,
    pub max_sequence_length: u32,

    // Narration audio format.
    pub sample_rate: u32,
    /// Row index of the reference speaker xvector in the public
    /// CMU Arctic embedding set.
    pub speaker_index: usize,

    // Video encoding.
    pub fps: u32,
    pub codec: String,
    pub preset: String,
    pub image_scale: f64,

    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_dir: "images".to_string(),
            image_stem: "flux-schnell_".to_string(),
            speech_stem: "speech".to_string(),
            inference_steps: 4,
            guidance_scale: 0.0,
            seed: 0,
            max_sequence_length: 128,
            sample_rate: 16_000,
            speaker_index: 7306,
            fps: 24,
            codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            image_scale: 0.5,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn image_filename(&self, index: usize) -> String {
        format!("{}{}.png", self.image_stem, index)
    }

    pub fn speech_filename(&self, index: usize) -> String {
        format!("{}{}.wav", self.speech_stem, index)
    }
}
