//! Gemini API client
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use super::{LlmPrompt, LlmProvider};
use crate::error::OrchestrationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

const PROVIDER: &str = "Gemini";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
            model,
        })
    }

    /// Point the client at a different endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != "your_gemini_api_key_here"
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, prompt: &LlmPrompt) -> crate::Result<String> {
        if !self.is_configured() {
            return Err(OrchestrationError::Configuration(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        // The key travels in a header; reqwest errors echo the URL
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.user.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: prompt.temperature,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: prompt.system.clone(),
                }],
            },
        };

        info!(model = %self.model, "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                OrchestrationError::external(PROVIDER, format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(OrchestrationError::external(
                PROVIDER,
                format!("{}: {}", status, error_text),
            ));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            OrchestrationError::external(PROVIDER, format!("unreadable response: {}", e))
        })?;

        let answer = first_text(&gemini_response).ok_or_else(|| {
            OrchestrationError::external(PROVIDER, "empty response from Gemini")
        })?;

        if let Some(usage) = &gemini_response.usage_metadata {
            info!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini response received"
            );
        }

        Ok(answer)
    }
}

fn first_text(response: &GeminiResponse) -> Option<String> {
    response
        .candidates
        .first()?
        .content
        .parts
        .first()
        .map(|p| p.text.clone())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: i32,
    #[serde(default)]
    candidates_token_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "¿Qué es una remesa?".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: "You are a financial translator".to_string(),
                }],
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("¿Qué es una remesa?"));
        assert!(json.contains("generationConfig"));
        assert!(json.contains("maxOutputTokens"));
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{
            "candidates": [{"content": {"parts": [{"text": "Hola"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 1}
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(first_text(&parsed).as_deref(), Some("Hola"));

        let empty: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(first_text(&empty), None);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client = GeminiClient::new(String::new(), "gemini-2.0-flash".to_string()).unwrap();
        let prompt = LlmPrompt {
            system: "s".to_string(),
            user: "u".to_string(),
            temperature: 0.2,
        };

        let err = client.generate(&prompt).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_does_not_expose_api_key() {
        let client = GeminiClient::new("SECRET-KEY-123".to_string(), "m".to_string())
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let prompt = LlmPrompt {
            system: "s".to_string(),
            user: "u".to_string(),
            temperature: 0.2,
        };

        let err = client.generate(&prompt).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::ExternalService { .. }));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "error: {}", err);
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }
}
