//! Agent adapters and registry
//!
//! Each agent turns one request into one provider call and wraps the answer
//! as a [`CapabilityResult`]. Agents hold no per-request state.

use crate::error::OrchestrationError;
use crate::models::{
    Capability, CapabilityResult, Language, ParsedOutput, PlanningDetails, RemittanceDetails,
    UserLevel,
};
use crate::parsing::render_text;
use crate::providers::{LedgerProvider, LlmPrompt, LlmProvider};
use crate::Result;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub mod multilingual;
pub mod planning;
pub mod remittance;
pub mod translation;

pub use multilingual::MultilingualReplyAgent;
pub use planning::FinancialPlanningAgent;
pub use remittance::RemittanceAgent;
pub use translation::TranslationAgent;

/// Everything an agent may read for one invocation
#[derive(Debug, Clone, Copy)]
pub struct AgentInput<'a> {
    pub text: &'a str,
    /// Language the answer should be written in
    pub language: Language,
    pub user_level: UserLevel,
    pub planning: Option<&'a PlanningDetails>,
    pub remittance: Option<&'a RemittanceDetails>,
}

/// Trait for a single capability adapter
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    fn capability(&self) -> Capability;
    fn description(&self) -> &'static str;
    async fn invoke(&self, input: &AgentInput<'_>) -> Result<CapabilityResult>;
}

/// Agent registry keyed by capability
pub struct AgentRegistry {
    agents: HashMap<Capability, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        self.agents.insert(agent.capability(), agent);
    }

    pub fn get(&self, capability: Capability) -> Option<Arc<dyn Agent>> {
        self.agents.get(&capability).cloned()
    }

    pub fn list(&self) -> Vec<(Capability, &'static str)> {
        let mut items: Vec<_> = self
            .agents
            .values()
            .map(|a| (a.capability(), a.description()))
            .collect();
        items.sort_by_key(|(c, _)| c.as_str());
        items
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with one agent per capability
pub fn create_default_registry(
    llm: Arc<dyn LlmProvider>,
    ledger: Arc<dyn LedgerProvider>,
) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(TranslationAgent::new(llm.clone())));
    registry.register(Arc::new(FinancialPlanningAgent::new(llm.clone())));
    registry.register(Arc::new(RemittanceAgent::new(llm.clone(), ledger)));
    registry.register(Arc::new(MultilingualReplyAgent::new(llm)));
    registry
}

/// Call the LLM and shape the answer.
///
/// A provider without credentials produces a `Degraded` result explaining
/// what is unavailable; every other failure propagates.
pub(crate) async fn complete(
    llm: &dyn LlmProvider,
    capability: Capability,
    prompt: LlmPrompt,
    input: &AgentInput<'_>,
    parse: fn(&str) -> ParsedOutput,
) -> Result<CapabilityResult> {
    let mut metadata = Map::new();
    metadata.insert("provider".into(), json!(llm.name()));
    metadata.insert("language".into(), json!(input.language.code()));
    metadata.insert("user_level".into(), json!(input.user_level));

    let output = match llm.generate(&prompt).await {
        Ok(raw) => parse(&raw),
        Err(OrchestrationError::Configuration(detail)) => {
            warn!(%capability, %detail, "LLM not configured, returning degraded result");
            metadata.insert("degraded".into(), Value::Bool(true));
            ParsedOutput::Degraded {
                reason: format!(
                    "The {} capability is running in degraded mode: the language model \
                     service is not configured on this server.",
                    capability
                ),
            }
        }
        Err(e) => return Err(e),
    };

    if matches!(output, ParsedOutput::Unparsed { .. }) {
        warn!(%capability, "Provider output did not match the expected shape");
    }

    Ok(CapabilityResult {
        capability,
        text_output: render_text(&output),
        output,
        metadata,
    })
}

/// Instruction appended to structured prompts
pub(crate) fn json_instruction(shape: &str) -> String {
    format!(
        "Reply with a single fenced ```json block containing an object of the form {}. \
         Do not add text outside the block.",
        shape
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{MockLedger, MockLlm};

    #[test]
    fn test_default_registry_covers_every_capability() {
        let registry = create_default_registry(
            Arc::new(MockLlm::echo()),
            Arc::new(MockLedger::working()),
        );

        for capability in Capability::ALL {
            let agent = registry.get(capability).expect("agent registered");
            assert_eq!(agent.capability(), capability);
        }
        assert_eq!(registry.list().len(), 4);
    }
}
