use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::{Config, RetryPolicy};
use crate::error::{Error, Result};
use crate::models::{ImageModel, RenderParams, SpeechModel, TextModel};

use async_trait::async_trait;

const TEXT_MODEL: &str = "gemini-pro";
const IMAGE_MODEL: &str = "flux-schnell";
const SPEECH_MODEL: &str = "speecht5-tts";

/// Public source of the reference speaker xvector.
const EMBEDDING_API: &str = "https://datasets-server.huggingface.co/rows\
?dataset=Matthijs/cmu-arctic-xvectors&config=default&split=validation";

const IMAGE_POLL_INTERVAL: Duration = Duration::from_secs(5);
const IMAGE_POLL_ATTEMPTS: u32 = 60;

/// Routes of the inference gateway fronting the three pretrained models.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub text: String,
    pub images: String,
    pub tasks: String,
    pub speech: String,
    pub embeddings: String,
}

impl Endpoints {
    pub fn from_gateway(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            text: format!("{base}/v1/text/generation"),
            images: format!("{base}/v1/images/generations"),
            tasks: format!("{base}/v1/tasks"),
            speech: format!("{base}/v1/audio/speech"),
            embeddings: EMBEDDING_API.to_string(),
        }
    }
}

/// Pure adapter over the external text, image, and speech models.
/// Holds no pipeline state beyond the cached speaker embedding.
#[derive(Debug)]
pub struct HttpModelProvider {
    api_key: String,
    client: Client,
    endpoints: Endpoints,
    retry: RetryPolicy,
    sample_rate: u32,
    speaker_index: usize,
    speaker_embedding: OnceCell<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    output: TextOutput,
}

#[derive(Debug, Deserialize)]
struct TextOutput {
    text: String,
}

#[derive(Debug, Deserialize)]
struct TaskSubmitResponse {
    output: TaskHandle,
}

#[derive(Debug, Deserialize)]
struct TaskHandle {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    output: TaskStatus,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    task_status: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRows {
    rows: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    row: XvectorRow,
}

#[derive(Debug, Deserialize)]
struct XvectorRow {
    xvector: Vec<f32>,
}

impl HttpModelProvider {
    pub fn new(api_key: String, gateway: &str, config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            client,
            endpoints: Endpoints::from_gateway(gateway),
            retry: config.retry,
            sample_rate: config.sample_rate,
            speaker_index: config.speaker_index,
            speaker_embedding: OnceCell::new(),
        }
    }

    /// POSTs a JSON body with bounded retry and linear backoff. Retries
    /// transport and HTTP-status failures only.
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let attempts = self.retry.attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let sent = self
                .client
                .post(url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(body)
                .send()
                .await;

            match sent {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    last_error = format!("HTTP {status}: {text}");
                }
                Err(e) => last_error = e.to_string(),
            }

            if attempt < attempts {
                warn!(
                    "model call failed (attempt {}/{}): {}",
                    attempt, attempts, last_error
                );
                tokio::time::sleep(self.retry.backoff * attempt).await;
            }
        }

        Err(Error::Model(last_error))
    }

    async fn wait_for_image_task(&self, task_id: &str) -> Result<String> {
        for attempt in 1..=IMAGE_POLL_ATTEMPTS {
            tokio::time::sleep(IMAGE_POLL_INTERVAL).await;

            let url = format!("{}/{}", self.endpoints.tasks, task_id);
            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                warn!("task status query failed (HTTP {}): {}", status, text);
                continue;
            }

            let task: TaskStatusResponse = response
                .json()
                .await
                .map_err(|e| Error::Model(format!("unreadable task status: {e}")))?;

            match task.output.task_status.as_str() {
                "SUCCEEDED" => {
                    return task
                        .output
                        .url
                        .ok_or_else(|| Error::Model("no image URL in task result".to_string()));
                }
                "FAILED" => return Err(Error::Model(format!("image task {task_id} failed"))),
                other => {
                    info!(
                        "image task {} status: {} (poll {}/{})",
                        task_id, other, attempt, IMAGE_POLL_ATTEMPTS
                    );
                }
            }
        }

        Err(Error::Model(format!("image task {task_id} timed out")))
    }

    /// Fetches the fixed reference xvector once and caches it for the
    /// lifetime of the provider.
    async fn reference_speaker(&self) -> Result<&[f32]> {
        let embedding = self
            .speaker_embedding
            .get_or_try_init(|| async {
                let url = format!(
                    "{}&offset={}&length=1",
                    self.endpoints.embeddings, self.speaker_index
                );
                info!("Fetching reference speaker embedding (row {})", self.speaker_index);

                let rows: EmbeddingRows = self
                    .client
                    .get(&url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await
                    .map_err(|e| Error::Model(format!("unreadable embedding row: {e}")))?;

                rows.rows
                    .into_iter()
                    .next()
                    .map(|r| r.row.xvector)
                    .ok_or_else(|| {
                        Error::Model(format!("no embedding row at index {}", self.speaker_index))
                    })
            })
            .await?;

        Ok(embedding)
    }
}

fn text_request(prompt: &str) -> serde_json::Value {
    json!({
        "model": TEXT_MODEL,
        "input": { "prompt": prompt }
    })
}

fn image_request(prompt: &str, params: &RenderParams) -> serde_json::Value {
    json!({
        "model": IMAGE_MODEL,
        "input": { "prompt": prompt },
        "parameters": {
            "num_inference_steps": params.steps,
            "guidance_scale": params.guidance_scale,
            "seed": params.seed,
            "max_sequence_length": params.max_sequence_length,
        }
    })
}

fn speech_request(text: &str, embedding: &[f32], sample_rate: u32) -> serde_json::Value {
    json!({
        "model": SPEECH_MODEL,
        "input": { "text": text },
        "parameters": {
            "speaker_embedding": embedding,
            "sample_rate": sample_rate,
            "format": "wav",
        }
    })
}

#[async_trait]
impl TextModel for HttpModelProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        info!("Requesting storyline text...");

        let response = self.post_json(&self.endpoints.text, &text_request(prompt)).await?;
        let parsed: TextResponse = response
            .json()
            .await
            .map_err(|e| Error::Model(format!("unreadable text response: {e}")))?;

        Ok(parsed.output.text)
    }
}

#[async_trait]
impl ImageModel for HttpModelProvider {
    async fn render(&self, prompt: &str, params: &RenderParams) -> Result<Vec<u8>> {
        info!("Submitting image render: {}", prompt);

        let response = self
            .post_json(&self.endpoints.images, &image_request(prompt, params))
            .await?;
        let submitted: TaskSubmitResponse = response
            .json()
            .await
            .map_err(|e| Error::Model(format!("unreadable image submission: {e}")))?;

        let image_url = self.wait_for_image_task(&submitted.output.task_id).await?;

        info!("Downloading image from: {}", image_url);
        let bytes = self
            .client
            .get(&image_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechModel for HttpModelProvider {
    async fn synthesize(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.reference_speaker().await?;

        info!("Synthesizing narration ({} chars)", text.len());
        let response = self
            .post_json(
                &self.endpoints.speech,
                &speech_request(text, embedding, self.sample_rate),
            )
            .await?;
        let wav_bytes = response.bytes().await?;

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav_bytes))
            .map_err(|e| Error::Model(format!("unreadable speech waveform: {e}")))?;
        let spec = reader.spec();
        if spec.sample_rate != self.sample_rate {
            return Err(Error::Model(format!(
                "speech model returned {} Hz, expected {}",
                spec.sample_rate, self.sample_rate
            )));
        }

        let samples: std::result::Result<Vec<i16>, _> = reader.samples::<i16>().collect();
        let samples =
            samples.map_err(|e| Error::Model(format!("corrupt speech waveform: {e}")))?;

        Ok(samples
            .into_iter()
            .map(|s| f32::from(s) / f32::from(i16::MAX))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_request_carries_fixed_inference_parameters() {
        let params = RenderParams {
            steps: 4,
            guidance_scale: 0.0,
            seed: 0,
            max_sequence_length: 128,
        };
        let body = image_request("a red fox", &params);
        assert_eq!(body["input"]["prompt"], "a red fox");
        assert_eq!(body["parameters"]["num_inference_steps"], 4);
        assert_eq!(body["parameters"]["guidance_scale"], 0.0);
        assert_eq!(body["parameters"]["seed"], 0);
        assert_eq!(body["parameters"]["max_sequence_length"], 128);
    }

    #[test]
    fn same_prompt_and_seed_build_identical_requests() {
        let params = RenderParams {
            steps: 4,
            guidance_scale: 0.0,
            seed: 0,
            max_sequence_length: 128,
        };
        assert_eq!(
            image_request("photosynthesis diagram", &params),
            image_request("photosynthesis diagram", &params)
        );
    }

    #[test]
    fn speech_request_carries_embedding_and_sample_rate() {
        let body = speech_request("hello", &[0.1, 0.2], 16_000);
        assert_eq!(body["parameters"]["sample_rate"], 16_000);
        assert_eq!(body["parameters"]["speaker_embedding"][1], 0.2);
        assert_eq!(body["input"]["text"], "hello");
    }

    #[test]
    fn gateway_routes_are_derived_from_base_url() {
        let endpoints = Endpoints::from_gateway("http://localhost:8000/");
        assert_eq!(endpoints.text, "http://localhost:8000/v1/text/generation");
        assert_eq!(endpoints.tasks, "http://localhost:8000/v1/tasks");
    }
}
