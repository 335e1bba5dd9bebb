pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// Parse `/start`, `/help` and their `@botname` forms.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// What the user sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Command(Command),
    Text(String),
    Voice { file_id: String },
    Photo { file_id: String },
}

/// A message received from the platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i32,
    pub user_id: Option<u64>,
    /// Display name of the user
    pub user_name: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Plain,
    Html,
}

/// Outbound side of the platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_typing(&self, chat_id: i64) -> Result<()>;

    /// Reply to a specific message.
    async fn reply(&self, to: &IncomingMessage, text: &str, markup: Markup) -> Result<()>;

    async fn send_message(&self, chat_id: i64, text: &str, markup: Markup) -> Result<()>;

    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;
}
