use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::story::{NarrationClip, RenderedImage};

/// The single encoded output file.
#[derive(Debug, Clone)]
pub struct FinalVideo {
    pub path: PathBuf,
    /// Sum of all segment durations, in seconds.
    pub duration: f64,
}

/// Pairs each rendered image with its narration clip and muxes the
/// segments into one video file via ffmpeg. Reads upstream artifacts,
/// never mutates them.
pub struct VideoComposer<'a> {
    config: &'a Config,
}

impl<'a> VideoComposer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub async fn compose(
        &self,
        images: &[RenderedImage],
        clips: &[NarrationClip],
        run_dir: &Path,
        output: &Path,
    ) -> Result<FinalVideo> {
        check_alignment(images, clips)?;

        // Segments of differing sizes are centered on a shared canvas
        // sized to the largest scaled image.
        let canvas = plan_canvas(images, self.config.image_scale)?;
        info!(
            "Composing {} segments on a {}x{} canvas",
            images.len(),
            canvas.0,
            canvas.1
        );

        let mut concat_content = String::new();
        for (image, clip) in images.iter().zip(clips) {
            let segment_path = run_dir.join(format!("segment_{}.mp4", image.index));
            self.create_segment(image, clip, canvas, &segment_path)?;

            let absolute = segment_path.canonicalize().map_err(|e| {
                Error::Encoding(format!("failed to resolve segment path: {e}"))
            })?;
            concat_content.push_str(&format!("file '{}'\n", absolute.display()));
        }

        let concat_file = run_dir.join("concat.txt");
        tokio::fs::write(&concat_file, concat_content).await?;

        self.concat_segments(&concat_file, output)?;

        let duration = clips.iter().map(|c| c.duration).sum();
        info!("Final video written: {}", output.display());
        Ok(FinalVideo {
            path: output.to_path_buf(),
            duration,
        })
    }

    /// One segment: the image scaled and centered, shown for the clip's
    /// duration with the narration as its audio track.
    fn create_segment(
        &self,
        image: &RenderedImage,
        clip: &NarrationClip,
        canvas: (u32, u32),
        output: &Path,
    ) -> Result<()> {
        info!("Creating segment {} ({:.2}s)", image.index, clip.duration);

        let filter = segment_filter(self.config.image_scale, canvas);
        let status = Command::new("ffmpeg")
            .args([
                "-y",
                "-loop",
                "1",
                "-i",
            ])
            .arg(&image.path)
            .arg("-i")
            .arg(&clip.path)
            .args([
                "-t",
                &clip.duration.to_string(),
                "-vf",
                &filter,
                "-r",
                &self.config.fps.to_string(),
                "-c:v",
                &self.config.codec,
                "-preset",
                &self.config.preset,
                "-pix_fmt",
                "yuv420p",
                "-c:a",
                "aac",
                "-shortest",
            ])
            .arg(output)
            .output()
            .map_err(|e| Error::Encoding(format!("failed to run ffmpeg: {e}")))?;

        if !status.status.success() {
            let stderr = String::from_utf8_lossy(&status.stderr);
            return Err(Error::Encoding(format!(
                "segment {} encoding failed: {}",
                image.index, stderr
            )));
        }
        Ok(())
    }

    fn concat_segments(&self, concat_file: &Path, output: &Path) -> Result<()> {
        info!("Concatenating segments...");

        // All segments share codec and canvas, so stream copy suffices.
        let status = Command::new("ffmpeg")
            .args(["-y", "-f", "concat", "-safe", "0", "-i"])
            .arg(concat_file)
            .args(["-c", "copy"])
            .arg(output)
            .output()
            .map_err(|e| Error::Encoding(format!("failed to run ffmpeg: {e}")))?;

        if !status.status.success() {
            let stderr = String::from_utf8_lossy(&status.stderr);
            return Err(Error::Encoding(format!("concat failed: {stderr}")));
        }
        Ok(())
    }
}

fn check_alignment(images: &[RenderedImage], clips: &[NarrationClip]) -> Result<()> {
    if images.len() != clips.len() {
        return Err(Error::Mismatch(format!(
            "{} images vs {} narration clips",
            images.len(),
            clips.len()
        )));
    }
    for (image, clip) in images.iter().zip(clips) {
        if image.index != clip.index {
            return Err(Error::Mismatch(format!(
                "image {} paired with clip {}",
                image.index, clip.index
            )));
        }
    }
    Ok(())
}

/// Canvas large enough for every scaled image, dimensions rounded down
/// to even values as yuv420p requires.
fn plan_canvas(images: &[RenderedImage], scale: f64) -> Result<(u32, u32)> {
    let mut canvas = (0u32, 0u32);
    for image in images {
        let (w, h) = image::image_dimensions(&image.path).map_err(|e| {
            Error::Encoding(format!("cannot read {}: {e}", image.path.display()))
        })?;
        let (sw, sh) = scaled_dims(w, h, scale);
        canvas.0 = canvas.0.max(sw);
        canvas.1 = canvas.1.max(sh);
    }
    Ok(canvas)
}

fn scaled_dims(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = ((f64::from(width) * scale) as u32).max(2);
    let h = ((f64::from(height) * scale) as u32).max(2);
    (w & !1, h & !1)
}

fn segment_filter(scale: f64, canvas: (u32, u32)) -> String {
    format!(
        "scale=trunc(iw*{scale}/2)*2:trunc(ih*{scale}/2)*2,\
         pad={}:{}:(ow-iw)/2:(oh-ih)/2",
        canvas.0, canvas.1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn image_at(index: usize, path: &str) -> RenderedImage {
        RenderedImage {
            index,
            path: PathBuf::from(path),
        }
    }

    fn clip_at(index: usize) -> NarrationClip {
        NarrationClip {
            index,
            path: PathBuf::from(format!("speech{index}.wav")),
            duration: 1.0,
        }
    }

    #[tokio::test]
    async fn mismatched_counts_are_rejected_before_any_encoding() {
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();

        let images = vec![image_at(0, "a.png"), image_at(1, "b.png")];
        let clips = vec![clip_at(0)];

        let result = VideoComposer::new(&config)
            .compose(&images, &clips, dir.path(), &dir.path().join("out.mp4"))
            .await;
        assert!(matches!(result, Err(Error::Mismatch(_))));
    }

    #[tokio::test]
    async fn misaligned_indices_are_rejected() {
        let config = Config::default();
        let dir = tempfile::tempdir().unwrap();

        let images = vec![image_at(0, "a.png"), image_at(2, "b.png")];
        let clips = vec![clip_at(0), clip_at(1)];

        let result = VideoComposer::new(&config)
            .compose(&images, &clips, dir.path(), &dir.path().join("out.mp4"))
            .await;
        assert!(matches!(result, Err(Error::Mismatch(_))));
    }

    #[test]
    fn scaled_dims_are_even() {
        assert_eq!(scaled_dims(1024, 768, 0.5), (512, 384));
        assert_eq!(scaled_dims(101, 77, 0.5), (50, 38));
        assert_eq!(scaled_dims(1, 1, 0.5), (2, 2));
    }

    #[test]
    fn canvas_covers_the_largest_scaled_image() {
        let dir = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.png");
        let wide = dir.path().join("wide.png");
        image::RgbImage::new(100, 80).save(&small).unwrap();
        image::RgbImage::new(300, 60).save(&wide).unwrap();

        let images = vec![
            RenderedImage { index: 0, path: small },
            RenderedImage { index: 1, path: wide },
        ];
        let canvas = plan_canvas(&images, 0.5).unwrap();
        assert_eq!(canvas, (150, 40));
    }

    #[test]
    fn segment_filter_centers_on_the_canvas() {
        let filter = segment_filter(0.5, (640, 360));
        assert!(filter.contains("pad=640:360:(ow-iw)/2:(oh-ih)/2"));
        assert!(filter.starts_with("scale=trunc(iw*0.5/2)*2"));
    }
}
