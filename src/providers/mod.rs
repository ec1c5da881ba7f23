//! External service boundaries
//!
//! Every outbound call the pipeline makes goes through one of these traits,
//! so the orchestrator can run against live services or the mocks in
//! [`mock`] without changes.

use crate::models::Language;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod elevenlabs;
pub mod gemini;
pub mod mock;
pub mod xrpl;

pub use elevenlabs::ElevenLabsClient;
pub use gemini::GeminiClient;
pub use xrpl::XrplTestnetClient;

/// Prompt handed to an LLM provider
#[derive(Debug, Clone)]
pub struct LlmPrompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Hosted large-language-model API
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Generate text. Missing credentials must surface as
    /// `OrchestrationError::Configuration`.
    async fn generate(&self, prompt: &LlmPrompt) -> Result<String>;
}

/// Voice used for one synthesis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub voice_id: String,
    pub model_id: String,
}

/// Text-to-speech API
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_configured(&self) -> bool;

    /// Returns encoded audio (mp3)
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        profile: &VoiceProfile,
    ) -> Result<Vec<u8>>;
}

/// Advisory fee/latency estimate for moving value across a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEstimate {
    pub network: String,
    pub fee: f64,
    pub fee_currency: String,
    pub settlement_secs: f64,
}

/// Blockchain testnet query used by remittance analysis
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn estimate(
        &self,
        amount: Option<f64>,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> Result<TransferEstimate>;
}
