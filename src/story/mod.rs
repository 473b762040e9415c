use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tone selector for the storyline prompt. Affects prompt framing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Style {
    /// Explain the topic through superheroes or other fictional characters.
    Fictional,
    /// Plain study-notes framing.
    Study,
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Style::Fictional => f.write_str("fictional"),
            Style::Study => f.write_str("study"),
        }
    }
}

/// One storyline unit: an image description plus the narration spoken
/// while that image is on screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    pub image_prompt: String,
    pub narration: String,
}

/// Ordered sequence of frames. Non-empty, indices contiguous from 0.
#[derive(Debug, Clone)]
pub struct Storyline(Vec<Frame>);

impl Storyline {
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::Format("storyline has no frames".to_string()));
        }
        for (i, frame) in frames.iter().enumerate() {
            if frame.index != i {
                return Err(Error::Format(format!(
                    "frame indices not contiguous: expected {} at position {}, got {}",
                    i, i, frame.index
                )));
            }
        }
        Ok(Self(frames))
    }

    pub fn frames(&self) -> &[Frame] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A frame's image prompt realized as a raster image on disk.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub index: usize,
    pub path: PathBuf,
}

/// A frame's narration realized as a 16 kHz mono waveform on disk.
#[derive(Debug, Clone)]
pub struct NarrationClip {
    pub index: usize,
    pub path: PathBuf,
    /// Seconds of synthesized speech; always > 0 for a valid clip.
    pub duration: f64,
}
