//! Topic-to-video learning content generator.
//!
//! Four stages, strictly in order: a text model turns the topic into a
//! storyline of frames, an image model renders one still per frame, a
//! speech model narrates each frame, and ffmpeg muxes the pairs into one
//! video. Every stage is fail-fast; artifacts live in a per-run temp
//! directory that is cleaned up on all exit paths.

pub mod config;
pub mod error;
pub mod models;
pub mod narration;
pub mod pipeline;
pub mod render;
pub mod story;
pub mod storyline;
pub mod video;

pub use config::{Config, RetryPolicy};
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use story::{Frame, NarrationClip, RenderedImage, Storyline, Style};
pub use video::FinalVideo;
