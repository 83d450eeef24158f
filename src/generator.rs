//! Content generation capabilities.
//!
//! The pipeline needs two things from the outside world: prose for a topic
//! and an image for a topic. Both sit behind traits so the orchestrator is
//! service-agnostic and tests can substitute recording fakes. The production
//! implementation is [`GeminiClient`](crate::gemini::GeminiClient).
//!
//! Calls are blocking. A failure of either call skips the record for this run;
//! nothing retries here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unusable response: {0}")]
    Unusable(String),
}

/// Decoded image returned by an [`ImageGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    /// File extension matching the sniffed format (`png`, `jpg`, `webp`).
    pub extension: &'static str,
}

impl GeneratedImage {
    /// Wrap raw bytes, sniffing the format from their magic number.
    ///
    /// Anything that isn't PNG, JPEG or WebP is rejected: the page would
    /// embed a broken image otherwise.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, GenerationError> {
        let format = image::guess_format(&bytes)
            .map_err(|_| GenerationError::Unusable("image data has no known format".into()))?;
        let extension = match format {
            image::ImageFormat::Png => "png",
            image::ImageFormat::Jpeg => "jpg",
            image::ImageFormat::WebP => "webp",
            other => {
                return Err(GenerationError::Unusable(format!(
                    "unsupported image format {other:?}"
                )));
            }
        };
        Ok(Self { bytes, extension })
    }
}

/// Produces blog prose for a topic.
pub trait TextGenerator {
    /// Generate a Markdown post about `topic`, seeded with `seed`.
    ///
    /// The response is expected to open with a short summary paragraph.
    fn generate_text(&self, topic: &str, seed: &str) -> Result<String, GenerationError>;
}

/// Produces a hero image for a topic.
pub trait ImageGenerator {
    fn generate_image(&self, topic: &str) -> Result<GeneratedImage, GenerationError>;
}

/// Prompt for the post text.
pub fn text_prompt(topic: &str, seed: &str) -> String {
    format!(
        "Write a comprehensive and engaging blog post about '{topic}' based on the idea: '{seed}'. \
         The post should include an introduction, 2-3 main sections with clear Markdown headings \
         (e.g., '## Section Title'), and a conclusion. Ensure the content flows naturally with \
         paragraphs. The tone should be informative and slightly enthusiastic. Provide a concise \
         summary (1-2 sentences) at the very beginning of the response, followed by a blank line, \
         *without* explicitly labeling it 'Summary:'. Do not use emojis or excessive special \
         characters like asterisks or hashtags within the main body of the text, only for \
         Markdown formatting."
    )
}

/// Prompt for the hero image.
pub fn image_prompt(topic: &str) -> String {
    format!(
        "A vibrant and engaging image representing '{topic}'. \
         Focus on concepts related to {topic}."
    )
}
