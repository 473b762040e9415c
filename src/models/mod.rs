//! Model provider seams. Each external pretrained capability sits behind
//! a trait so the pipeline can be exercised with mock models in tests and
//! the HTTP provider stays a pure adapter.

mod http;

pub use http::HttpModelProvider;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;

/// Fixed inference parameters for one image render. Same prompt + same
/// params must reproduce the same image on the provider side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub steps: u32,
    pub guidance_scale: f64,
    pub seed: u64,
    pub max_sequence_length: u32,
}

impl RenderParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            steps: config.inference_steps,
            guidance_scale: config.guidance_scale,
            seed: config.seed,
            max_sequence_length: config.max_sequence_length,
        }
    }
}

#[async_trait]
pub trait TextModel: Send + Sync {
    /// One completion call: free-text prompt in, raw free-text response out.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Renders one prompt to encoded PNG bytes.
    async fn render(&self, prompt: &str, params: &RenderParams) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Synthesizes narration as mono samples at the configured sample rate.
    async fn synthesize(&self, text: &str) -> Result<Vec<f32>>;
}
