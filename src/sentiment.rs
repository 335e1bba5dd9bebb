//! Customer sentiment scoring on a five-level star scale.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use teloxide::utils::html;
use tracing::{debug, info, warn};

use crate::config::SentimentConfig;

/// Sent in place of a report when the model cannot be reached.
pub const UNAVAILABLE_NOTICE: &str = "⚠️ Modelo de Sentimiento no disponible.";

const UNKNOWN_GLYPH: &str = "❓";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentimentResult {
    pub label: String,
    pub score: f32,
}

/// Ordered from most negative to most positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SentimentLevel {
    OneStar,
    TwoStars,
    ThreeStars,
    FourStars,
    FiveStars,
}

impl SentimentLevel {
    pub const ALL: [SentimentLevel; 5] = [
        SentimentLevel::OneStar,
        SentimentLevel::TwoStars,
        SentimentLevel::ThreeStars,
        SentimentLevel::FourStars,
        SentimentLevel::FiveStars,
    ];

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|level| level.label() == label)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OneStar => "1 star",
            Self::TwoStars => "2 stars",
            Self::ThreeStars => "3 stars",
            Self::FourStars => "4 stars",
            Self::FiveStars => "5 stars",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::OneStar => "😠",
            Self::TwoStars => "😟",
            Self::ThreeStars => "😐",
            Self::FourStars => "🙂",
            Self::FiveStars => "😊",
        }
    }
}

pub fn glyph_for(label: &str) -> &'static str {
    SentimentLevel::from_label(label)
        .map(SentimentLevel::glyph)
        .unwrap_or(UNKNOWN_GLYPH)
}

/// Render a result as the HTML message sent to the chat.
pub fn format_report(result: &SentimentResult) -> String {
    format!(
        "📈 Análisis de Sentimiento del Cliente:\n\
         Sentimiento Detectado: <b>{}</b> {}\n\
         (Confianza: {:.2}%)",
        html::escape(&result.label.to_uppercase()),
        glyph_for(&result.label),
        result.score * 100.0
    )
}

#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Classify `text`. An error means the model is unavailable.
    async fn classify(&self, text: &str) -> Result<SentimentResult>;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

/// TEI `/predict` answers with a flat list, the HF inference API nests it.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Flat(Vec<SentimentResult>),
    Nested(Vec<Vec<SentimentResult>>),
}

impl ClassifyResponse {
    fn best(self) -> Option<SentimentResult> {
        let candidates = match self {
            ClassifyResponse::Flat(list) => list,
            ClassifyResponse::Nested(lists) => lists.into_iter().flatten().collect(),
        };
        candidates
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Text-classification model served over HTTP.
pub struct HttpSentimentModel {
    client: reqwest::Client,
    config: SentimentConfig,
}

impl HttpSentimentModel {
    pub fn new(config: SentimentConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build sentiment HTTP client")?;

        info!(
            "Sentiment model configured: model={}, url={}",
            config.model, config.endpoint
        );
        Ok(Self { client, config })
    }

    /// Probe the endpoint once so startup logs show whether sentiment works.
    pub async fn warm_up(&self) {
        match self.classify("hola").await {
            Ok(_) => info!("Sentiment model ready"),
            Err(e) => warn!("Sentiment model not reachable yet: {:#}", e),
        }
    }
}

#[async_trait]
impl SentimentModel for HttpSentimentModel {
    async fn classify(&self, text: &str) -> Result<SentimentResult> {
        let mut request = self
            .client
            .post(&self.config.endpoint)
            .json(&ClassifyRequest { inputs: text });
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to call sentiment endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sentiment endpoint error ({}): {}", status, body);
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .context("Failed to parse sentiment response")?;

        let result = parsed.best().context("Sentiment endpoint returned no labels")?;
        debug!("Sentiment: {} ({:.3})", result.label, result.score);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve_json, serve_silence};
    use std::time::Duration;

    fn model(endpoint: String) -> HttpSentimentModel {
        HttpSentimentModel::new(SentimentConfig {
            endpoint,
            request_timeout_secs: 1,
            ..SentimentConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_report_for_every_level() {
        for level in SentimentLevel::ALL {
            let report = format_report(&SentimentResult {
                label: level.label().to_string(),
                score: 0.5,
            });
            assert!(report.contains(&level.label().to_uppercase()));
            assert!(report.contains(level.glyph()));
            assert!(report.contains("50.00%"));
        }
    }

    #[test]
    fn test_report_five_stars() {
        let report = format_report(&SentimentResult {
            label: "5 stars".to_string(),
            score: 0.95,
        });
        assert!(report.contains("5 STARS"));
        assert!(report.contains("😊"));
        assert!(report.contains("95.00%"));
    }

    #[test]
    fn test_unknown_label_uses_fallback_glyph() {
        let report = format_report(&SentimentResult {
            label: "NEU".to_string(),
            score: 0.123,
        });
        assert!(report.contains("<b>NEU</b> ❓"));
        assert!(report.contains("12.30%"));
    }

    #[test]
    fn test_label_is_escaped() {
        let report = format_report(&SentimentResult {
            label: "<x>".to_string(),
            score: 1.0,
        });
        assert!(report.contains("&lt;X&gt;"));
        assert!(report.contains("100.00%"));
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(SentimentLevel::OneStar < SentimentLevel::FiveStars);
        let mut sorted = SentimentLevel::ALL;
        sorted.sort();
        assert_eq!(sorted, SentimentLevel::ALL);
    }

    #[test]
    fn test_from_label_is_lenient_on_case_and_spaces() {
        assert_eq!(
            SentimentLevel::from_label(" 4 Stars "),
            Some(SentimentLevel::FourStars)
        );
        assert_eq!(SentimentLevel::from_label("1 stars"), None);
    }

    #[test]
    fn test_flat_response_picks_highest_score() {
        let parsed: ClassifyResponse = serde_json::from_str(
            r#"[{"label":"2 stars","score":0.1},{"label":"5 stars","score":0.8},{"label":"4 stars","score":0.1}]"#,
        )
        .unwrap();
        assert_eq!(parsed.best().unwrap().label, "5 stars");
    }

    #[test]
    fn test_nested_response_picks_highest_score() {
        let parsed: ClassifyResponse = serde_json::from_str(
            r#"[[{"label":"1 star","score":0.7},{"label":"3 stars","score":0.3}]]"#,
        )
        .unwrap();
        let best = parsed.best().unwrap();
        assert_eq!(best.label, "1 star");
        assert!((best.score - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_response_has_no_result() {
        let parsed: ClassifyResponse = serde_json::from_str("[]").unwrap();
        assert!(parsed.best().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let model = model("http://127.0.0.1:9/predict".to_string());
        assert!(model.classify("hola").await.is_err());
    }

    #[tokio::test]
    async fn test_classify_returns_best_label() {
        let (base_url, server) = serve_json(
            r#"[{"label":"1 star","score":0.02},{"label":"5 stars","score":0.95},{"label":"4 stars","score":0.03}]"#,
        )
        .await;

        let result = model(format!("{}/predict", base_url))
            .classify("Estoy feliz con el producto")
            .await
            .unwrap();

        assert_eq!(result.label, "5 stars");
        assert!((result.score - 0.95).abs() < f32::EPSILON);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /predict"));
        assert!(request.contains(r#"{"inputs":"Estoy feliz con el producto"}"#));
    }

    #[tokio::test]
    async fn test_classify_sends_api_token() {
        let (base_url, server) = serve_json(r#"[[{"label":"3 stars","score":0.6}]]"#).await;

        let model = HttpSentimentModel::new(SentimentConfig {
            endpoint: base_url,
            api_token: Some("hf_token".to_string()),
            ..SentimentConfig::default()
        })
        .unwrap();
        let result = model.classify("normal").await.unwrap();

        assert_eq!(result.label, "3 stars");
        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("authorization: bearer hf_token"));
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out() {
        let model = model(serve_silence().await);

        let outcome = tokio::time::timeout(Duration::from_secs(10), model.classify("hola")).await;

        let result = outcome.expect("classify should give up on its own");
        assert!(result.is_err());
    }
}
