//! Gemini assistant proxy

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GeminiConfig;

pub const UNAVAILABLE: &str = "Assistant unavailable. Please try again later.";
pub const FAILED: &str = "Sorry, the assistant encountered an error.";
pub const NETWORK: &str = "Network error. Please check your connection and try again.";
pub const NO_RESPONSE: &str = "No response.";

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant API key not configured")]
    NotConfigured,
    #[error("provider rejected request ({status})")]
    Rejected { status: u16 },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Generated text, or `None` when the model returned no candidates
    async fn generate(&self, prompt: &str) -> Result<Option<String>, AssistantError>;
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl AssistantProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, AssistantError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AssistantError::NotConfigured)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp = self
            .http
            .post(url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssistantError::Rejected {
                status: status.as_u16(),
            });
        }

        let raw = resp.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&raw).map_err(|e| AssistantError::Malformed(e.to_string()))?;

        let Some(first) = parsed.candidates.into_iter().next() else {
            return Ok(None);
        };
        let text: String = first
            .content
            .ok_or_else(|| AssistantError::Malformed("candidate without content".into()))?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if text.is_empty() {
            return Err(AssistantError::Malformed("candidate without text".into()));
        }
        Ok(Some(text))
    }
}

/// Run a prompt and reduce every outcome to text for the user
pub async fn ask(provider: &dyn AssistantProvider, prompt: &str) -> String {
    match provider.generate(prompt).await {
        Ok(Some(text)) => text,
        Ok(None) => NO_RESPONSE.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Assistant request failed");
            match e {
                AssistantError::NotConfigured | AssistantError::Rejected { .. } => UNAVAILABLE,
                AssistantError::Malformed(_) => FAILED,
                AssistantError::Transport(_) => NETWORK,
            }
            .to_string()
        }
    }
}
