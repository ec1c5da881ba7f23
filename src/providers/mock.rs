//! In-process providers for tests and keyless development
//! Keeps the pipeline functional without network access

use super::{LedgerProvider, LlmPrompt, LlmProvider, SpeechProvider, TransferEstimate, VoiceProfile};
use crate::error::OrchestrationError;
use crate::models::Language;
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Behaviour {
    Reply(String),
    Echo,
    Unconfigured,
    Failing,
}

/// Mock LLM that records every prompt it sees
pub struct MockLlm {
    behaviour: Behaviour,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<LlmPrompt>>,
}

impl MockLlm {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Always answers with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with(Behaviour::Reply(reply.into()))
    }

    /// Answers with the user prompt, prefixed
    pub fn echo() -> Self {
        Self::with(Behaviour::Echo)
    }

    /// Behaves like a provider with no API key
    pub fn unconfigured() -> Self {
        Self::with(Behaviour::Unconfigured)
    }

    /// Behaves like a provider that is down
    pub fn failing() -> Self {
        Self::with(Behaviour::Failing)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<LlmPrompt> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn name(&self) -> &'static str {
        "MockLLM"
    }

    async fn generate(&self, prompt: &LlmPrompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.clone());
        }

        match &self.behaviour {
            Behaviour::Reply(text) => Ok(text.clone()),
            Behaviour::Echo => Ok(format!("[mock] {}", prompt.user)),
            Behaviour::Unconfigured => Err(OrchestrationError::Configuration(
                "mock LLM has no API key".to_string(),
            )),
            Behaviour::Failing => Err(OrchestrationError::external("MockLLM", "503 service unavailable")),
        }
    }
}

/// Mock TTS returning a fixed byte payload
pub struct MockSpeech {
    configured: bool,
    failing: bool,
    calls: AtomicUsize,
}

impl MockSpeech {
    pub fn working() -> Self {
        Self {
            configured: true,
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            configured: true,
            failing: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    fn name(&self) -> &'static str {
        "MockTTS"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        _profile: &VoiceProfile,
    ) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.configured {
            return Err(OrchestrationError::Configuration(
                "mock TTS has no API key".to_string(),
            ));
        }
        if self.failing {
            return Err(OrchestrationError::external("MockTTS", "quota exhausted"));
        }

        Ok(format!("ID3-mock:{}:{}", language.code(), text.len()).into_bytes())
    }
}

/// Mock ledger with a fixed estimate
pub struct MockLedger {
    failing: bool,
}

impl MockLedger {
    pub fn working() -> Self {
        Self { failing: false }
    }

    pub fn failing() -> Self {
        Self { failing: true }
    }
}

#[async_trait]
impl LedgerProvider for MockLedger {
    fn name(&self) -> &'static str {
        "MockLedger"
    }

    async fn estimate(
        &self,
        _amount: Option<f64>,
        _source: Option<&str>,
        _destination: Option<&str>,
    ) -> Result<TransferEstimate> {
        if self.failing {
            return Err(OrchestrationError::external("MockLedger", "node unreachable"));
        }

        Ok(TransferEstimate {
            network: "mock-ledger".to_string(),
            fee: 0.000012,
            fee_currency: "XRP".to_string(),
            settlement_secs: 4.0,
        })
    }
}
