use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use tracing::info;

use crate::config::GroqConfig;
use crate::llm::{ChatMessage, ChatRequest, ContentPart, ImageUrl, LlmClient};
use crate::prompts::VISION_PROMPT;

#[async_trait]
pub trait ImageDescriber: Send + Sync {
    async fn describe(&self, image: &[u8]) -> Result<String>;
}

/// Inline an image as a base64 `data:` URL.
pub fn to_data_url(image: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(image)
    )
}

/// Product photo recognition through the Groq vision model.
pub struct GroqVision {
    llm: Arc<LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GroqVision {
    pub fn new(llm: Arc<LlmClient>, groq: &GroqConfig) -> Self {
        Self {
            llm,
            model: groq.vision_model.clone(),
            temperature: groq.vision_temperature,
            max_tokens: groq.vision_max_tokens,
        }
    }

    fn request(&self, image: &[u8]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user_parts(vec![
                ContentPart::Text {
                    text: VISION_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: to_data_url(image),
                    },
                },
            ])],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl ImageDescriber for GroqVision {
    async fn describe(&self, image: &[u8]) -> Result<String> {
        if image.is_empty() {
            anyhow::bail!("Image is empty");
        }

        info!("Describing image ({} bytes)", image.len());
        self.llm.chat(&self.request(image)).await
    }
}
