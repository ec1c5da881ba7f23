//! Request pipeline
//!
//! DETECT → ROUTE → GATE → AGENT → VOICE? → RESPOND
//!
//! `handle` never fails. Every error is folded into the response status so
//! callers always get a typed answer back.

use crate::agents::{create_default_registry, AgentInput, AgentRegistry};
use crate::audit::{compute_request_hash, DecisionLog, DecisionRecord};
use crate::config::Settings;
use crate::detector::LanguageDetector;
use crate::error::OrchestrationError;
use crate::models::{
    Capability, CapabilityResult, DetectedLanguage, ErrorMarker, Language, Request, Response,
    ResponseStatus, VoiceArtifact,
};
use crate::monetization::{
    GateDecision, InMemoryUsageStore, MonetizationGate, StaticSubscriptions,
};
use crate::providers::{ElevenLabsClient, LlmProvider, XrplTestnetClient};
use crate::router::CapabilityRouter;
use crate::voice::VoiceAdapter;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Main orchestrator that coordinates one request end to end
pub struct Orchestrator {
    registry: AgentRegistry,
    voice: VoiceAdapter,
    gate: MonetizationGate,
    decisions: DecisionLog,
}

/// What one pass through the pipeline produced
enum Outcome {
    Ok {
        result: CapabilityResult,
        voice: Option<VoiceArtifact>,
    },
    Denied(ErrorMarker),
    Failed(ErrorMarker),
}

impl Orchestrator {
    pub fn new(
        registry: AgentRegistry,
        voice: VoiceAdapter,
        gate: MonetizationGate,
        decisions: DecisionLog,
    ) -> Self {
        Self {
            registry,
            voice,
            gate,
            decisions,
        }
    }

    /// Wire the live speech, ledger and subscription providers around `llm`
    pub fn from_settings(settings: &Settings, llm: Arc<dyn LlmProvider>) -> crate::Result<Self> {
        let speech = Arc::new(ElevenLabsClient::new(settings.elevenlabs_api_key.clone())?);
        let ledger = Arc::new(XrplTestnetClient::new(settings.xrpl_rpc_url.clone())?);

        let voice = VoiceAdapter::new(speech, settings.voice_output_dir.clone())
            .with_default_voice(settings.default_voice_id.clone());
        let gate = MonetizationGate::new(
            Arc::new(StaticSubscriptions::parse(&settings.user_tiers)),
            Arc::new(InMemoryUsageStore::new()),
        );

        Ok(Self::new(
            create_default_registry(llm, ledger),
            voice,
            gate,
            DecisionLog::new(),
        ))
    }

    pub fn gate(&self) -> &MonetizationGate {
        &self.gate
    }

    pub fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Run one request through the pipeline
    pub async fn handle(&self, request: &Request) -> Response {
        let start_time = Instant::now();
        let request_id = Uuid::new_v4();

        let detected = LanguageDetector::detect(&request.raw_text);
        let capability = CapabilityRouter::route(request);
        let language = request.target_language(&detected);

        info!(
            %request_id,
            user_id = %request.user_id,
            detected = %detected.language,
            %language,
            %capability,
            "Orchestrator: handling request"
        );

        let outcome = self.run(request, capability, language).await;

        let response = match outcome {
            Outcome::Ok { result, voice } => Response {
                request_id,
                detected_language: detected,
                capability,
                status: ResponseStatus::Ok,
                capability_result: Some(result),
                voice_artifact: voice,
                error: None,
            },
            Outcome::Denied(marker) => {
                Self::without_result(request_id, detected, capability, ResponseStatus::Denied, marker)
            }
            Outcome::Failed(marker) => {
                Self::without_result(request_id, detected, capability, ResponseStatus::Failed, marker)
            }
        };

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            %request_id,
            status = ?response.status,
            elapsed_ms,
            "Orchestrator: request complete"
        );

        self.log_decision(request, &response, language, elapsed_ms).await;
        response
    }

    async fn run(&self, request: &Request, capability: Capability, language: Language) -> Outcome {
        if request.raw_text.trim().is_empty() {
            return Outcome::Failed(marker(&OrchestrationError::InvalidRequest(
                "Please enter a question or some text to work with.".to_string(),
            )));
        }

        // === GATE ===
        match self
            .gate
            .check_and_increment(&request.user_id, capability)
            .await
        {
            Ok(GateDecision::Allowed { tier, remaining }) => {
                debug!(%tier, remaining, "Gate: allowed");
            }
            Ok(GateDecision::Denied { tier, limit, .. }) => {
                info!(%tier, limit, %capability, "Gate: denied");
                return Outcome::Denied(marker(&OrchestrationError::QuotaExceeded {
                    capability: capability.to_string(),
                }));
            }
            Err(e) => {
                error!("Gate check failed: {}", e);
                return Outcome::Failed(marker(&e));
            }
        }

        // === AGENT ===
        let Some(agent) = self.registry.get(capability) else {
            let e = OrchestrationError::Configuration(format!("no agent for {}", capability));
            error!("{}", e);
            return Outcome::Failed(marker(&e));
        };

        let input = AgentInput {
            text: &request.raw_text,
            language,
            user_level: request.user_level,
            planning: request.planning.as_ref(),
            remittance: request.remittance.as_ref(),
        };

        let result = match agent.invoke(&input).await {
            Ok(result) => result,
            Err(e) => {
                error!(%capability, "Agent failed: {}", e);
                return Outcome::Failed(marker(&e));
            }
        };

        // === VOICE ===
        let wants_voice = request.voice_output || capability == Capability::VoiceSynthesize;
        let voice = if wants_voice {
            match self.voice.synthesize(&result, language).await {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    warn!(%language, "Voice stage failed, returning text only: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Outcome::Ok { result, voice }
    }

    fn without_result(
        request_id: Uuid,
        detected: DetectedLanguage,
        capability: Capability,
        status: ResponseStatus,
        marker: ErrorMarker,
    ) -> Response {
        Response {
            request_id,
            detected_language: detected,
            capability,
            status,
            capability_result: None,
            voice_artifact: None,
            error: Some(marker),
        }
    }

    async fn log_decision(
        &self,
        request: &Request,
        response: &Response,
        language: Language,
        elapsed_ms: u64,
    ) {
        let record = DecisionRecord {
            decision_id: Uuid::new_v4(),
            request_id: response.request_id,
            user_id: request.user_id.clone(),
            capability: response.capability,
            language,
            status: response.status,
            request_hash: compute_request_hash(request),
            created_at: Utc::now(),
            elapsed_ms,
        };

        if let Err(e) = self.decisions.record(record).await {
            warn!("Failed to record decision: {}", e);
        }
    }
}

fn marker(e: &OrchestrationError) -> ErrorMarker {
    ErrorMarker {
        kind: e.kind().to_string(),
        message: e.user_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParsedOutput, Tier};
    use crate::providers::mock::{MockLedger, MockLlm, MockSpeech};
    use crate::providers::SpeechProvider;

    fn orchestrator_with(
        llm: Arc<dyn LlmProvider>,
        speech: Arc<dyn SpeechProvider>,
        subscriptions: StaticSubscriptions,
    ) -> Orchestrator {
        let dir = std::env::temp_dir().join(format!("moneylingo-orch-{}", Uuid::new_v4()));
        Orchestrator::new(
            create_default_registry(llm, Arc::new(MockLedger::working())),
            VoiceAdapter::new(speech, dir),
            MonetizationGate::new(
                Arc::new(subscriptions),
                Arc::new(InMemoryUsageStore::new()),
            ),
            DecisionLog::new(),
        )
    }

    #[tokio::test]
    async fn test_english_retirement_question_gets_a_plan() {
        let orchestrator = orchestrator_with(
            Arc::new(MockLlm::echo()),
            Arc::new(MockSpeech::working()),
            StaticSubscriptions::new(),
        );

        let response = orchestrator
            .handle(&Request::new("u1", "Hello, how can I save money for retirement?"))
            .await;

        assert_eq!(response.status, ResponseStatus::Ok);
        assert_eq!(response.detected_language, DetectedLanguage::matched(Language::English));
        assert_eq!(response.capability, Capability::FinancialPlan);
        let result = response.capability_result.unwrap();
        assert!(!result.text_output.is_empty());
        assert!(response.voice_artifact.is_none());
    }

    #[tokio::test]
    async fn test_spanish_voice_request() {
        let speech = Arc::new(MockSpeech::working());
        let orchestrator = orchestrator_with(
            Arc::new(MockLlm::replying("Claro, empecemos por un fondo de emergencia.")),
            speech.clone(),
            StaticSubscriptions::new(),
        );

        let request = Request::new("u1", "Hola, necesito ayuda con mi plan de jubilación")
            .with_capability(Capability::VoiceSynthesize);
        let response = orchestrator.handle(&request).await;

        assert_eq!(response.status, ResponseStatus::Ok);
        assert_eq!(response.detected_language.language, Language::Spanish);
        let artifact = response.voice_artifact.unwrap();
        assert_eq!(artifact.source_language, Language::Spanish);
        assert!(artifact.audio_ref.is_some());
        assert_eq!(speech.calls(), 1);
    }

    #[tokio::test]
    async fn test_voice_unconfigured_keeps_text() {
        let orchestrator = orchestrator_with(
            Arc::new(MockLlm::replying("Claro.")),
            Arc::new(MockSpeech::unconfigured()),
            StaticSubscriptions::new(),
        );

        let request = Request::new("u1", "Hola, necesito ayuda con mi plan de jubilación")
            .with_capability(Capability::VoiceSynthesize);
        let response = orchestrator.handle(&request).await;

        assert_eq!(response.status, ResponseStatus::Ok);
        assert_eq!(response.capability_result.unwrap().text_output, "Claro.");
        let artifact = response.voice_artifact.unwrap();
        assert!(artifact.audio_ref.is_none());
        assert_eq!(artifact.source_language, Language::Spanish);
    }

    #[tokio::test]
    async fn test_voice_failure_keeps_text() {
        let orchestrator = orchestrator_with(
            Arc::new(MockLlm::replying("Start with a budget.")),
            Arc::new(MockSpeech::failing()),
            StaticSubscriptions::new(),
        );

        let request = Request::new("u1", "what is a budget?").with_voice();
        let response = orchestrator.handle(&request).await;

        assert_eq!(response.status, ResponseStatus::Ok);
        assert!(response.voice_artifact.is_none());
        assert!(response.error.is_none());
        assert!(response
            .capability_result
            .unwrap()
            .text_output
            .contains("Start with a budget"));
    }

    #[tokio::test]
    async fn test_quota_denial_invokes_no_agent() {
        let llm = Arc::new(MockLlm::echo());
        let orchestrator = orchestrator_with(
            llm.clone(),
            Arc::new(MockSpeech::working()),
            StaticSubscriptions::new(),
        );
        let request = Request::new("u1", "help me plan my budget")
            .with_capability(Capability::FinancialPlan);

        for _ in 0..5 {
            assert_eq!(orchestrator.handle(&request).await.status, ResponseStatus::Ok);
        }
        assert_eq!(llm.calls(), 5);

        let response = orchestrator.handle(&request).await;
        assert_eq!(response.status, ResponseStatus::Denied);
        assert!(response.capability_result.is_none());
        assert_eq!(response.error.unwrap().kind, "quota_exceeded");
        assert_eq!(llm.calls(), 5);

        let usage = orchestrator.gate().usage("u1").await.unwrap();
        assert_eq!(usage.tier, Tier::Free);
        let plan = usage
            .capabilities
            .iter()
            .find(|c| c.capability == Capability::FinancialPlan)
            .unwrap();
        assert_eq!(plan.used, 5);
    }

    #[tokio::test]
    async fn test_provider_failure_is_marked_failed() {
        let orchestrator = orchestrator_with(
            Arc::new(MockLlm::failing()),
            Arc::new(MockSpeech::working()),
            StaticSubscriptions::new(),
        );

        let response = orchestrator
            .handle(&Request::new("u1", "what is compound interest?"))
            .await;

        assert_eq!(response.status, ResponseStatus::Failed);
        let error = response.error.unwrap();
        assert_eq!(error.kind, "external_service");
        assert!(!error.message.contains("503"));
    }

    #[tokio::test]
    async fn test_unconfigured_llm_degrades_instead_of_failing() {
        let orchestrator = orchestrator_with(
            Arc::new(MockLlm::unconfigured()),
            Arc::new(MockSpeech::working()),
            StaticSubscriptions::new(),
        );

        let response = orchestrator
            .handle(&Request::new("u1", "what is compound interest?"))
            .await;

        assert_eq!(response.status, ResponseStatus::Ok);
        let result = response.capability_result.unwrap();
        assert!(matches!(result.output, ParsedOutput::Degraded { .. }));
    }

    #[tokio::test]
    async fn test_explicit_language_drives_agent_and_voice() {
        let llm = Arc::new(MockLlm::replying("Bonjour"));
        let orchestrator = orchestrator_with(
            llm.clone(),
            Arc::new(MockSpeech::working()),
            StaticSubscriptions::new(),
        );

        let request = Request::new("u1", "Hola amigo")
            .with_language(Language::French)
            .with_voice();
        let response = orchestrator.handle(&request).await;

        assert_eq!(response.detected_language.language, Language::Spanish);
        assert_eq!(
            response.voice_artifact.unwrap().source_language,
            Language::French
        );
        assert!(llm.last_prompt().unwrap().system.contains("French"));
    }

    #[tokio::test]
    async fn test_empty_text_spends_no_quota() {
        let llm = Arc::new(MockLlm::echo());
        let orchestrator = orchestrator_with(
            llm.clone(),
            Arc::new(MockSpeech::working()),
            StaticSubscriptions::new(),
        );

        let response = orchestrator.handle(&Request::new("u1", "   ")).await;
        assert_eq!(response.status, ResponseStatus::Failed);
        assert!(!response.detected_language.detected);
        assert_eq!(response.error.unwrap().kind, "invalid_request");
        assert_eq!(llm.calls(), 0);

        let usage = orchestrator.gate().usage("u1").await.unwrap();
        assert!(usage.capabilities.iter().all(|c| c.used == 0));
    }

    #[tokio::test]
    async fn test_every_request_is_logged() {
        let orchestrator = orchestrator_with(
            Arc::new(MockLlm::echo()),
            Arc::new(MockSpeech::working()),
            StaticSubscriptions::new(),
        );

        let request = Request::new("u9", "Send $200 to Mexico");
        let response = orchestrator.handle(&request).await;
        assert_eq!(response.capability, Capability::RemittanceAnalyze);

        let records = orchestrator.decisions().list_for_user("u9").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].request_id, response.request_id);
        assert!(orchestrator
            .decisions()
            .verify_integrity(records[0].decision_id, &request)
            .await
            .unwrap());
    }
}
