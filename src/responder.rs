use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::config::GroqConfig;
use crate::dataset::Dataset;
use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::prompts::{build_instruction, PromptLinks};

#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, user_text: &str) -> Result<String>;
}

/// Answers customer messages from the store dataset through the chat model.
pub struct GroqResponder {
    llm: Arc<LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    instruction: String,
}

impl GroqResponder {
    pub fn new(
        llm: Arc<LlmClient>,
        groq: &GroqConfig,
        dataset: &Dataset,
        links: &PromptLinks<'_>,
    ) -> Self {
        Self {
            llm,
            model: groq.chat_model.clone(),
            temperature: groq.chat_temperature,
            max_tokens: groq.chat_max_tokens,
            instruction: build_instruction(dataset, links),
        }
    }

    fn request(&self, user_text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.instruction.clone()),
                ChatMessage::user(user_text),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl ChatResponder for GroqResponder {
    async fn respond(&self, user_text: &str) -> Result<String> {
        let reply = self.llm.chat(&self.request(user_text)).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            anyhow::bail!("Chat model returned an empty reply");
        }

        debug!("Chat reply: {} chars", reply.len());
        Ok(reply.to_string())
    }
}
