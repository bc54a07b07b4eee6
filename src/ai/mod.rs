//! AI service integration for prompt, image and interpretation generation
//!
//! Chat and image generation are separate capabilities so each can be mocked
//! on its own. Chat methods return the model's raw text; validation happens
//! in [`crate::parse`].

pub mod mime;
pub mod mock;
pub mod openai;

pub use mock::{MockChatClient, MockImageGenerationClient};
pub use openai::{OpenAiChatClient, OpenAiImageClient};

use crate::models::DreamSubmission;
use crate::variation::Variation;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Three keywords describing the dream, as free text.
    async fn extract_keywords(&self, narrative: &str) -> Result<String>;

    /// One detailed image prompt built from keywords.
    async fn compose_image_prompt(&self, keywords: &str) -> Result<String>;

    /// Raw reply containing one photorealistic prompt per variation.
    async fn diversify_prompts(&self, narrative: &str, variations: &[Variation])
        -> Result<String>;

    /// Raw reply expected to hold the interpretation JSON object.
    async fn interpret_dream(&self, submission: &DreamSubmission) -> Result<String>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generate one image and return where it can be fetched from.
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}
