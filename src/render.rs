use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::models::{ImageModel, RenderParams};
use crate::story::{RenderedImage, Storyline};

/// Renders one still image per frame, fail-fast and in index order.
pub struct ImageRenderer<'a> {
    model: &'a dyn ImageModel,
    config: &'a Config,
}

impl<'a> ImageRenderer<'a> {
    pub fn new(model: &'a dyn ImageModel, config: &'a Config) -> Self {
        Self { model, config }
    }

    pub async fn render(&self, storyline: &Storyline, run_dir: &Path) -> Result<Vec<RenderedImage>> {
        let image_dir = run_dir.join(&self.config.image_dir);
        tokio::fs::create_dir_all(&image_dir).await?;

        let params = RenderParams::from_config(self.config);
        let mut images = Vec::with_capacity(storyline.len());

        for frame in storyline.frames() {
            let bytes = self.model.render(&frame.image_prompt, &params).await?;
            let path = image_dir.join(self.config.image_filename(frame.index));
            tokio::fs::write(&path, &bytes).await?;

            info!(
                "Rendered image {}/{}: {}",
                frame.index + 1,
                storyline.len(),
                path.display()
            );
            images.push(RenderedImage {
                index: frame.index,
                path,
            });
        }

        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::story::Frame;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubImage {
        calls: AtomicUsize,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl ImageModel for StubImage {
        async fn render(&self, _prompt: &str, _params: &RenderParams) -> Result<Vec<u8>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(call) {
                return Err(Error::Model("render backend down".to_string()));
            }
            Ok(vec![0u8; 16])
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
    async fn renders_one_image_per_frame_in_order() {
        let model = StubImage {
            calls: AtomicUsize::new(0),
            fail_at: None,
        };
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();

        let images = ImageRenderer::new(&model, &config)
            .render(&storyline(3), dir.path())
            .await
            .unwrap();

        assert_eq!(images.len(), 3);
        for (i, image) in images.iter().enumerate() {
            assert_eq!(image.index, i);
            assert!(image.path.exists());
            assert!(image
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .contains(&i.to_string()));
        }
    }

    #[tokio::test]
    async fn aborts_the_batch_on_first_failure() {
        let model = StubImage {
            calls: AtomicUsize::new(0),
            fail_at: Some(1),
        };
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();

        let result = ImageRenderer::new(&model, &config)
            .render(&storyline(4), dir.path())
            .await;

        assert!(matches!(result, Err(Error::Model(_))));
        // Fail-fast: frames after the failing one are never attempted.
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }
}
