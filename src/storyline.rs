use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::TextModel;
use crate::story::{Frame, Storyline, Style};

/// Turns a topic into an ordered storyline via one text model call.
pub struct StorylineGenerator<'a> {
    model: &'a dyn TextModel,
}

impl<'a> StorylineGenerator<'a> {
    pub fn new(model: &'a dyn TextModel) -> Self {
        Self { model }
    }

    pub async fn generate(&self, topic: &str, style: Style) -> Result<Storyline> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::Format("topic must not be empty".to_string()));
        }

        info!("Generating storyline for topic: {}", topic);
        let response = self.model.complete(&build_prompt(topic, style)).await?;

        let storyline = parse_frames(&response)?;
        info!("Generated storyline with {} frames", storyline.len());
        Ok(storyline)
    }
}

fn build_prompt(topic: &str, style: Style) -> String {
    let framing = match style {
        Style::Fictional => format!(
            "Create an engaging story that explains {topic} using superheroes \
             or other fictional characters. The story should be educational \
             and easy for students to understand."
        ),
        Style::Study => format!(
            "Create clear, well-structured study material that explains {topic} \
             step by step, suitable for revision notes."
        ),
    };

    format!(
        r#"{framing} Break the content into frames. Each frame must be a JSON object with exactly two keys: "image_prompt" for the image description and "narration" for the accompanying text. Return the response as a JSON array of such objects, like this:
[
    {{"image_prompt": "description of image 1", "narration": "text for image 1"}},
    {{"image_prompt": "description of image 2", "narration": "text for image 2"}}
]
At the end, make a strong connection back to the actual concept of {topic} and conclude effectively. Make scientific and theoretical explanations where needed and keep narrations detailed. Return only the JSON array, with no additional text or commentary."#
    )
}

/// Strict parse of the model's raw response. The response must be the
/// literal JSON array, nothing else; any commentary or stray key is a
/// format failure with no repair attempted.
fn parse_frames(raw: &str) -> Result<Storyline> {
    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct RawFrame {
        image_prompt: String,
        narration: String,
    }

    let parsed: Vec<RawFrame> = serde_json::from_str(raw.trim())
        .map_err(|e| Error::Format(format!("response is not a frame list: {e}")))?;

    let frames = parsed
        .into_iter()
        .enumerate()
        .map(|(index, f)| Frame {
            index,
            image_prompt: f.image_prompt,
            narration: f.narration,
        })
        .collect();

    Storyline::new(frames)
}
