mod bot;
mod config;
mod dataset;
mod llm;
mod platform;
mod prompts;
mod responder;
mod sentiment;
#[cfg(test)]
mod test_support;
mod vision;
mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::Orchestrator;
use crate::config::{Config, Secrets};
use crate::dataset::load_dataset;
use crate::llm::LlmClient;
use crate::prompts::PromptLinks;
use crate::responder::{ChatResponder, GroqResponder};
use crate::sentiment::HttpSentimentModel;
use crate::vision::GroqVision;
use crate::voice::GroqTranscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let secrets = Secrets::from_env().context("Missing credentials")?;

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("storebot.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Chat model: {}", config.groq.chat_model);
    info!("  Vision model: {}", config.groq.vision_model);
    info!("  Transcription model: {}", config.groq.transcription_model);
    info!("  Dataset: {}", config.store.dataset_path.display());

    let bot = Bot::new(secrets.telegram_token());

    let llm = Arc::new(LlmClient::new(
        &config.groq.base_url,
        secrets.groq_api_key,
        config.groq.request_timeout(),
    )?);

    // Without a dataset the bot still runs; text and voice answer with a notice
    let chat: Option<Arc<dyn ChatResponder>> = match load_dataset(&config.store.dataset_path) {
        Ok(dataset) => {
            info!(
                "Dataset loaded for {}",
                dataset.company_name().unwrap_or("unknown company")
            );
            let links = PromptLinks {
                support_url: &config.store.support_url,
                category_example_url: &config.store.category_example_url,
            };
            let responder: Arc<dyn ChatResponder> = Arc::new(GroqResponder::new(
                llm.clone(),
                &config.groq,
                &dataset,
                &links,
            ));
            Some(responder)
        }
        Err(e) => {
            error!("Dataset unavailable: {}", e);
            None
        }
    };

    let transcriber = Arc::new(GroqTranscriber::new(
        llm.clone(),
        &config.groq,
        &config.transcription,
    ));
    let describer = Arc::new(GroqVision::new(llm, &config.groq));

    let sentiment = Arc::new(HttpSentimentModel::new(config.sentiment.clone())?);
    sentiment.warm_up().await;

    let orchestrator = Arc::new(Orchestrator::new(
        chat,
        transcriber,
        describer,
        sentiment,
        config.store.shop_url.clone(),
    ));

    info!("Bot is starting...");
    platform::telegram::run(bot, orchestrator, &config.telegram).await?;

    Ok(())
}
