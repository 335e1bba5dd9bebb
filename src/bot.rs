use std::sync::Arc;

use teloxide::utils::html;
use tracing::{error, info, warn};

use crate::platform::{IncomingMessage, Markup, Messenger, Payload};
use crate::prompts::WELCOME_PROMPT;
use crate::responder::ChatResponder;
use crate::sentiment::{format_report, SentimentModel, UNAVAILABLE_NOTICE};
use crate::vision::ImageDescriber;
use crate::voice::Transcriber;

const WELCOME_NO_DATASET: &str = "Error, no se cargo el dataset, intente más tarde.";
const WELCOME_FAILED: &str = "Lo siento no pude procesar su mensaje.";

const TEXT_NO_DATASET: &str = "⚠️ No se cargo el dataset, intentar luego.";
const TEXT_FAILED: &str = "Lo siento no pude procesar su solicitud de chat.";

const VOICE_NO_DATASET: &str = "⚠️ No está cargado el dataset.";
const VOICE_DOWNLOAD_FAILED: &str = "Error al descargar el archivo de voz.";
const VOICE_TRANSCRIPTION_FAILED: &str = "Lo siento, no pude transcribir tú mensaje 😔";
const VOICE_CHAT_FAILED: &str = "La consulta no pudo ser procesada";

const PHOTO_RECEIVED: &str = "📸 Leyendo tu imagen...";
const PHOTO_DOWNLOAD_FAILED: &str = "⚠️ Ocurrió un error al procesar tu imagen. Intenta de nuevo.";
const PHOTO_ANALYSIS_FAILED: &str =
    "❌ No pude analizar la imagen. Por favor, intenta con otra imagen.";

/// Routes each incoming message to its handler and the adapters it needs.
///
/// Every message is handled on its own; nothing is remembered between
/// messages. Adapter failures end the handler with one apology reply.
pub struct Orchestrator {
    /// `None` when the store dataset could not be loaded.
    chat: Option<Arc<dyn ChatResponder>>,
    transcriber: Arc<dyn Transcriber>,
    describer: Arc<dyn ImageDescriber>,
    sentiment: Arc<dyn SentimentModel>,
    shop_url: String,
}

impl Orchestrator {
    pub fn new(
        chat: Option<Arc<dyn ChatResponder>>,
        transcriber: Arc<dyn Transcriber>,
        describer: Arc<dyn ImageDescriber>,
        sentiment: Arc<dyn SentimentModel>,
        shop_url: String,
    ) -> Self {
        Self {
            chat,
            transcriber,
            describer,
            sentiment,
            shop_url,
        }
    }

    pub async fn handle(&self, messenger: &dyn Messenger, msg: IncomingMessage) {
        match &msg.payload {
            Payload::Command(_) => self.handle_welcome(messenger, &msg).await,
            Payload::Text(text) => self.handle_text(messenger, &msg, text).await,
            Payload::Voice { file_id } => self.handle_voice(messenger, &msg, file_id).await,
            Payload::Photo { file_id } => self.handle_photo(messenger, &msg, file_id).await,
        }
    }

    async fn handle_welcome(&self, messenger: &dyn Messenger, msg: &IncomingMessage) {
        let Some(chat) = &self.chat else {
            reply(messenger, msg, WELCOME_NO_DATASET, Markup::Plain).await;
            return;
        };

        typing(messenger, msg.chat_id).await;
        match chat.respond(WELCOME_PROMPT).await {
            Ok(welcome) => reply(messenger, msg, &welcome, Markup::Plain).await,
            Err(e) => {
                error!("Welcome generation failed: {:#}", e);
                reply(messenger, msg, WELCOME_FAILED, Markup::Plain).await;
            }
        }
    }

    async fn handle_text(&self, messenger: &dyn Messenger, msg: &IncomingMessage, text: &str) {
        let Some(chat) = &self.chat else {
            reply(messenger, msg, TEXT_NO_DATASET, Markup::Plain).await;
            return;
        };

        typing(messenger, msg.chat_id).await;
        match chat.respond(text).await {
            Ok(answer) => reply(messenger, msg, &answer, Markup::Plain).await,
            Err(e) => {
                error!("Chat reply failed for chat {}: {:#}", msg.chat_id, e);
                reply(messenger, msg, TEXT_FAILED, Markup::Plain).await;
                return;
            }
        }

        self.send_sentiment(messenger, msg.chat_id, text).await;
    }

    async fn handle_voice(&self, messenger: &dyn Messenger, msg: &IncomingMessage, file_id: &str) {
        let Some(chat) = &self.chat else {
            reply(messenger, msg, VOICE_NO_DATASET, Markup::Plain).await;
            return;
        };

        typing(messenger, msg.chat_id).await;

        let audio = match messenger.download(file_id).await {
            Ok(audio) => audio,
            Err(e) => {
                error!("Voice download failed: {:#}", e);
                reply(messenger, msg, VOICE_DOWNLOAD_FAILED, Markup::Plain).await;
                return;
            }
        };

        let transcript = match self.transcriber.transcribe(&audio).await {
            Ok(transcript) => transcript,
            Err(e) => {
                error!("Transcription failed: {:#}", e);
                reply(messenger, msg, VOICE_TRANSCRIPTION_FAILED, Markup::Plain).await;
                return;
            }
        };

        match chat.respond(&transcript).await {
            Ok(answer) => {
                let text = format!(
                    "<b>Transcripción:</b> {}\n\n{}",
                    html::escape(&transcript),
                    html::escape(&answer)
                );
                reply(messenger, msg, &text, Markup::Html).await;
            }
            Err(e) => {
                error!("Chat reply to voice note failed: {:#}", e);
                reply(messenger, msg, VOICE_CHAT_FAILED, Markup::Plain).await;
                return;
            }
        }

        self.send_sentiment(messenger, msg.chat_id, &transcript).await;
    }

    async fn handle_photo(&self, messenger: &dyn Messenger, msg: &IncomingMessage, file_id: &str) {
        reply(messenger, msg, PHOTO_RECEIVED, Markup::Plain).await;

        let image = match messenger.download(file_id).await {
            Ok(image) => image,
            Err(e) => {
                error!("Photo download failed: {:#}", e);
                reply(messenger, msg, PHOTO_DOWNLOAD_FAILED, Markup::Plain).await;
                return;
            }
        };

        match self.describer.describe(&image).await {
            Ok(description) => {
                let text = format!("{} \n {}", description, self.shop_url);
                reply(messenger, msg, &text, Markup::Plain).await;
            }
            Err(e) => {
                error!("Image analysis failed: {:#}", e);
                reply(messenger, msg, PHOTO_ANALYSIS_FAILED, Markup::Plain).await;
            }
        }
    }

    /// Classify `text` and send the result as its own message.
    async fn send_sentiment(&self, messenger: &dyn Messenger, chat_id: i64, text: &str) {
        typing(messenger, chat_id).await;

        let (report, markup) = match self.sentiment.classify(text).await {
            Ok(result) => {
                info!("Sentiment for chat {}: {} ({:.2})", chat_id, result.label, result.score);
                (format_report(&result), Markup::Html)
            }
            Err(e) => {
                warn!("Sentiment model unavailable: {:#}", e);
                (UNAVAILABLE_NOTICE.to_string(), Markup::Plain)
            }
        };

        if let Err(e) = messenger.send_message(chat_id, &report, markup).await {
            error!("Failed to send sentiment report: {:#}", e);
        }
    }
}

async fn reply(messenger: &dyn Messenger, msg: &IncomingMessage, text: &str, markup: Markup) {
    if let Err(e) = messenger.reply(msg, text, markup).await {
        error!("Failed to reply in chat {}: {:#}", msg.chat_id, e);
    }
}

async fn typing(messenger: &dyn Messenger, chat_id: i64) {
    messenger.send_typing(chat_id).await.ok();
}
