//! ElevenLabs text-to-speech client

use super::{SpeechProvider, VoiceProfile};
use crate::error::OrchestrationError;
use crate::models::Language;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

const PROVIDER: &str = "ElevenLabs";
const BASE_URL: &str = "https://api.elevenlabs.io/v1";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

pub struct ElevenLabsClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ElevenLabsClient {
    /// `api_key = None` yields a client that reports itself unconfigured
    pub fn new(api_key: Option<String>) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    language_code: &'a str,
}

#[async_trait]
impl SpeechProvider for ElevenLabsClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        profile: &VoiceProfile,
    ) -> crate::Result<Vec<u8>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            OrchestrationError::Configuration("ELEVENLABS_API_KEY not configured".to_string())
        })?;

        let url = format!(
            "{}/text-to-speech/{}?output_format={}",
            self.base_url, profile.voice_id, OUTPUT_FORMAT
        );

        let body = SpeechRequest {
            text,
            model_id: &profile.model_id,
            language_code: language.code(),
        };

        info!(voice_id = %profile.voice_id, language = %language, "Calling ElevenLabs TTS");

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("ElevenLabs request failed: {}", e);
                OrchestrationError::external(PROVIDER, format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "ElevenLabs error response: {}", error_text);
            return Err(OrchestrationError::external(
                PROVIDER,
                format!("{}: {}", status, error_text),
            ));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| OrchestrationError::external(PROVIDER, format!("body read failed: {}", e)))?;

        Ok(audio.to_vec())
    }
}
