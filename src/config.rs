use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingSecret(&'static str),
}

/// Credentials the process refuses to start without.
pub struct Secrets {
    pub telegram_token: SecretString,
    pub groq_api_key: SecretString,
}

impl Secrets {
    /// Read both secrets from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from)
                .ok_or(ConfigError::MissingSecret(name))
        };

        Ok(Self {
            telegram_token: read(TELEGRAM_TOKEN_VAR)?,
            groq_api_key: read(GROQ_API_KEY_VAR)?,
        })
    }

    pub fn telegram_token(&self) -> &str {
        self.telegram_token.expose_secret()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroqConfig {
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,
    #[serde(default = "default_chat_max_tokens")]
    pub chat_max_tokens: u32,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_vision_temperature")]
    pub vision_temperature: f32,
    #[serde(default = "default_vision_max_tokens")]
    pub vision_max_tokens: u32,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl GroqConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: default_groq_base_url(),
            chat_model: default_chat_model(),
            chat_temperature: default_chat_temperature(),
            chat_max_tokens: default_chat_max_tokens(),
            vision_model: default_vision_model(),
            vision_temperature: default_vision_temperature(),
            vision_max_tokens: default_vision_max_tokens(),
            transcription_model: default_transcription_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Spoken language hint passed to Whisper
    #[serde(default = "default_language")]
    pub language: String,
    /// Free-text context hint
    #[serde(default = "default_transcription_prompt")]
    pub prompt: String,
    #[serde(default = "default_transcription_temperature")]
    pub temperature: f32,
    /// Where voice notes are staged before upload
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            prompt: default_transcription_prompt(),
            temperature: default_transcription_temperature(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    /// Catalog link appended to every image description
    #[serde(default = "default_shop_url")]
    pub shop_url: String,
    #[serde(default = "default_support_url")]
    pub support_url: String,
    #[serde(default = "default_category_example_url")]
    pub category_example_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            shop_url: default_shop_url(),
            support_url: default_support_url(),
            category_example_url: default_category_example_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SentimentConfig {
    #[serde(default = "default_sentiment_endpoint")]
    pub endpoint: String,
    /// Informational; the endpoint decides which model actually answers
    #[serde(default = "default_sentiment_model")]
    pub model: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_sentiment_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl SentimentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            endpoint: default_sentiment_endpoint(),
            model: default_sentiment_model(),
            api_token: None,
            request_timeout_secs: default_sentiment_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default = "default_polling_timeout_secs")]
    pub polling_timeout_secs: u64,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            polling_timeout_secs: default_polling_timeout_secs(),
            retry_backoff_secs: default_retry_backoff_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub groq: GroqConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_chat_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_chat_temperature() -> f32 {
    0.3
}

fn default_chat_max_tokens() -> u32 {
    500
}

fn default_vision_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}

fn default_vision_temperature() -> f32 {
    0.7
}

fn default_vision_max_tokens() -> u32 {
    750
}

fn default_transcription_model() -> String {
    "whisper-large-v3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_language() -> String {
    "es".to_string()
}

fn default_transcription_prompt() -> String {
    "Especificar contexto o pronunciación".to_string()
}

fn default_transcription_temperature() -> f32 {
    1.0
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("dataset.json")
}

fn default_shop_url() -> String {
    "https://shop.samsung.com/ar/".to_string()
}

fn default_support_url() -> String {
    "https://www.samsung.com/ca/support/contact/".to_string()
}

fn default_category_example_url() -> String {
    "https://www.samsung.com/ar/smartphones/".to_string()
}

fn default_sentiment_endpoint() -> String {
    "http://127.0.0.1:8080/predict".to_string()
}

fn default_sentiment_model() -> String {
    "nlptown/bert-base-multilingual-uncased-sentiment".to_string()
}

fn default_sentiment_timeout_secs() -> u64 {
    15
}

fn default_polling_timeout_secs() -> u64 {
    20
}

fn default_retry_backoff_secs() -> u64 {
    1
}

impl Config {
    /// Load settings from a TOML file. A missing file means "all defaults".
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_both_secrets_present() {
        let secrets = Secrets::from_lookup(lookup(&[
            (TELEGRAM_TOKEN_VAR, "123:abc"),
            (GROQ_API_KEY_VAR, "gsk_test"),
        ]))
        .unwrap();
        assert_eq!(secrets.telegram_token(), "123:abc");
        assert_eq!(secrets.groq_api_key.expose_secret(), "gsk_test");
    }

    #[test]
    fn test_missing_telegram_token_is_fatal() {
        let err = Secrets::from_lookup(lookup(&[(GROQ_API_KEY_VAR, "gsk_test")]))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingSecret(TELEGRAM_TOKEN_VAR)));
    }

    #[test]
    fn test_missing_groq_key_is_fatal() {
        let err = Secrets::from_lookup(lookup(&[(TELEGRAM_TOKEN_VAR, "123:abc")]))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingSecret(GROQ_API_KEY_VAR)));
        assert!(err.to_string().contains(GROQ_API_KEY_VAR));
    }

    #[test]
    fn test_blank_secret_counts_as_missing() {
        let err = Secrets::from_lookup(lookup(&[
            (TELEGRAM_TOKEN_VAR, "123:abc"),
            (GROQ_API_KEY_VAR, "   "),
        ]))
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::MissingSecret(GROQ_API_KEY_VAR)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load(Path::new("/nonexistent/storebot.toml")).unwrap();
        assert_eq!(config.groq.chat_model, "llama-3.3-70b-versatile");
        assert_eq!(config.groq.chat_max_tokens, 500);
        assert_eq!(config.transcription.language, "es");
        assert_eq!(config.store.shop_url, "https://shop.samsung.com/ar/");
        assert_eq!(config.telegram.polling_timeout_secs, 20);
        assert_eq!(config.sentiment.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storebot.toml");
        std::fs::write(
            &path,
            "[groq]\nchat_model = \"custom-model\"\n\n[store]\nshop_url = \"https://example.com/shop/\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.groq.chat_model, "custom-model");
        assert_eq!(config.groq.vision_max_tokens, 750);
        assert_eq!(config.store.shop_url, "https://example.com/shop/");
        assert_eq!(
            config.store.support_url,
            "https://www.samsung.com/ca/support/contact/"
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storebot.toml");
        std::fs::write(&path, "[groq\nchat_model = ").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
