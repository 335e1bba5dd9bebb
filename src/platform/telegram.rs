use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, ChatAction, FileId, MessageId, ParseMode, ReplyParameters,
};
use teloxide::update_listeners::Polling;
use tracing::{debug, info, warn};

use crate::bot::Orchestrator;
use crate::config::TelegramConfig;
use crate::platform::{Command, IncomingMessage, Markup, Messenger, Payload};

/// Telegram rejects messages above 4096 chars; leave room for entities.
const MAX_MESSAGE_LEN: usize = 4000;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Convert a Telegram message into the platform-neutral shape.
///
/// Returns `None` for message kinds the bot does not answer (stickers,
/// documents, service messages, ...).
pub fn to_incoming(msg: &Message) -> Option<IncomingMessage> {
    let payload = if let Some(text) = msg.text() {
        match Command::parse(text) {
            Some(command) => Payload::Command(command),
            None => Payload::Text(text.to_string()),
        }
    } else if let Some(voice) = msg.voice() {
        Payload::Voice {
            file_id: voice.file.id.0.clone(),
        }
    } else if let Some(photos) = msg.photo() {
        // Sizes are ordered smallest to largest
        let largest = photos.last()?;
        Payload::Photo {
            file_id: largest.file.id.0.clone(),
        }
    } else {
        return None;
    };

    let user = msg.from.as_ref();
    Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        user_id: user.map(|u| u.id.0),
        user_name: user
            .map(|u| u.first_name.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        payload,
    })
}

pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_chunks(
        &self,
        chat_id: i64,
        text: &str,
        markup: Markup,
        reply_to: Option<i32>,
    ) -> Result<()> {
        for (i, chunk) in split_message(text, MAX_MESSAGE_LEN).into_iter().enumerate() {
            let mut request = self.bot.send_message(ChatId(chat_id), chunk);
            if markup == Markup::Html {
                request = request.parse_mode(ParseMode::Html);
            }
            if let (0, Some(message_id)) = (i, reply_to) {
                request = request.reply_parameters(ReplyParameters::new(MessageId(message_id)));
            }
            request.await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await?;
        Ok(())
    }

    async fn reply(&self, to: &IncomingMessage, text: &str, markup: Markup) -> Result<()> {
        self.send_chunks(to.chat_id, text, markup, Some(to.message_id))
            .await
    }

    async fn send_message(&self, chat_id: i64, text: &str, markup: Markup) -> Result<()> {
        self.send_chunks(chat_id, text, markup, None).await
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        let mut data = Vec::new();
        self.bot.download_file(&file.path, &mut data).await?;
        debug!("Downloaded {} ({} bytes)", file.path, data.len());
        Ok(data)
    }
}

/// Run the Telegram bot platform
pub async fn run(bot: Bot, orchestrator: Arc<Orchestrator>, config: &TelegramConfig) -> Result<()> {
    info!("Starting Telegram platform...");

    let commands = vec![
        BotCommand::new("start", "Mensaje de bienvenida de la tienda"),
        BotCommand::new("help", "Qué puede hacer este asistente"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let backoff = Duration::from_secs(config.retry_backoff_secs);
    let listener = Polling::builder(bot.clone())
        .timeout(Duration::from_secs(config.polling_timeout_secs))
        .backoff_strategy(move |_| backoff)
        .delete_webhook()
        .await
        .build();

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![orchestrator])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("telegram polling"),
        )
        .await;

    info!("Telegram platform stopped");
    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    orchestrator: Arc<Orchestrator>,
) -> ResponseResult<()> {
    let Some(incoming) = to_incoming(&msg) else {
        debug!("Ignoring unsupported message {} in chat {}", msg.id.0, msg.chat.id.0);
        return Ok(());
    };

    info!(
        "Telegram message from {} ({:?}) in chat {}",
        incoming.user_name, incoming.user_id, incoming.chat_id
    );

    let messenger = TelegramMessenger::new(bot);
    orchestrator.handle(&messenger, incoming).await;
    Ok(())
}
