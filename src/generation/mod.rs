use anyhow::Context;
use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::{ComparatorError, Result};

/// Gemini models the comparator knows how to call
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelIdentifier {
    /// Gemini 1.5 Pro
    #[default]
    #[value(name = "gemini-1.5-pro")]
    #[serde(rename = "gemini-1.5-pro")]
    Gemini15Pro,
    /// Gemini 1.5 Flash
    #[value(name = "gemini-1.5-flash")]
    #[serde(rename = "gemini-1.5-flash")]
    Gemini15Flash,
    /// Gemini 2.0 Flash (experimental)
    #[value(name = "gemini-2.0-flash-exp")]
    #[serde(rename = "gemini-2.0-flash-exp")]
    Gemini20FlashExp,
}

impl ModelIdentifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelIdentifier::Gemini15Pro => "gemini-1.5-pro",
            ModelIdentifier::Gemini15Flash => "gemini-1.5-flash",
            ModelIdentifier::Gemini20FlashExp => "gemini-2.0-flash-exp",
        }
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single prompt to send to a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: ModelIdentifier,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, model: ModelIdentifier) -> Self {
        Self {
            prompt: prompt.into(),
            model,
        }
    }
}

/// Raw text returned by a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
    pub model: ModelIdentifier,
    pub finish_reason: Option<String>,
}

/// Generative-text service seam
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send one prompt and return the model's raw text
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;

    /// Get the name of this service
    fn service_name(&self) -> &'static str;
}

/// Client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    client: Client,
    api_base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Create a client; fails when no API key was supplied
    pub fn new(config: &GenerationConfig, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ComparatorError::MissingApiKey(crate::config::API_KEY_ENV.to_string()))?;

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: ModelIdentifier) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base_url,
            urlencoding::encode(model.as_str())
        )
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        tracing::debug!(
            "Sending {} char prompt to {}",
            request.prompt.len(),
            request.model
        );

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint(request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload = response.text().await?;
        if !status.is_success() {
            anyhow::bail!("Gemini API returned HTTP {}: {}", status, payload.trim());
        }

        let (text, finish_reason) = extract_text(&payload)?;

        Ok(GenerationResult {
            text,
            model: request.model,
            finish_reason,
        })
    }

    fn service_name(&self) -> &'static str {
        "Gemini"
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(payload: &str) -> Result<(String, Option<String>)> {
    let response: GenerateContentResponse =
        serde_json::from_str(payload).context("Invalid Gemini API response")?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Gemini API response contained no candidates"))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok((text, candidate.finish_reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_identifier_names() {
        assert_eq!(ModelIdentifier::default(), ModelIdentifier::Gemini15Pro);
        assert_eq!(ModelIdentifier::Gemini20FlashExp.to_string(), "gemini-2.0-flash-exp");
        assert_eq!(
            ModelIdentifier::from_str("gemini-1.5-flash", false),
            Ok(ModelIdentifier::Gemini15Flash)
        );
        assert!(ModelIdentifier::from_str("gpt-4", false).is_err());
    }

    #[test]
    fn test_model_identifier_serde() {
        let yaml = serde_yaml::to_string(&ModelIdentifier::Gemini15Flash).unwrap();
        assert_eq!(yaml.trim(), "gemini-1.5-flash");

        let parsed: ModelIdentifier = serde_yaml::from_str("gemini-2.0-flash-exp").unwrap();
        assert_eq!(parsed, ModelIdentifier::Gemini20FlashExp);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let payload = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "| Feature |"}, {"text": " Phone 1 |"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10}
        }"#;

        let (text, finish_reason) = extract_text(payload).unwrap();
        assert_eq!(text, "| Feature | Phone 1 |");
        assert_eq!(finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_extract_text_allows_empty_content() {
        let payload = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let (text, finish_reason) = extract_text(payload).unwrap();
        assert!(text.is_empty());
        assert_eq!(finish_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_extract_text_without_candidates_fails() {
        assert!(extract_text(r#"{"promptFeedback": {"blockReason": "OTHER"}}"#).is_err());
        assert!(extract_text("not json").is_err());
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = GenerationConfig::default();
        assert!(GeminiClient::new(&config, None).is_err());
        assert!(GeminiClient::new(&config, Some("  ".to_string())).is_err());

        let client = GeminiClient::new(&config, Some("key".to_string())).unwrap();
        assert_eq!(
            client.endpoint(ModelIdentifier::Gemini15Pro),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }
}
