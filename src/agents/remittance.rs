//! Remittance analysis agent
//!
//! Combines an LLM cost/risk analysis with an advisory testnet fee estimate.

use super::{complete, json_instruction, Agent, AgentInput};
use crate::models::{Capability, CapabilityResult, RemittanceDetails};
use crate::parsing::parse_remittance;
use crate::providers::{LedgerProvider, LlmPrompt, LlmProvider};
use crate::router::{extract_amount, extract_corridor};
use crate::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub struct RemittanceAgent {
    llm: Arc<dyn LlmProvider>,
    ledger: Arc<dyn LedgerProvider>,
}

impl RemittanceAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, ledger: Arc<dyn LedgerProvider>) -> Self {
        Self { llm, ledger }
    }

    /// Structured fields win; gaps are filled from the free text
    fn resolve_details(input: &AgentInput<'_>) -> RemittanceDetails {
        let mut details = input.remittance.cloned().unwrap_or_default();

        if details.amount.is_none() {
            if let Some(amount) = extract_amount(input.text) {
                details.amount = Some(amount.value);
                if details.currency.is_none() {
                    details.currency = amount.currency;
                }
            }
        }

        if details.source_country.is_none() || details.destination_country.is_none() {
            let (from, to) = extract_corridor(input.text);
            details.source_country = details.source_country.or(from);
            details.destination_country = details.destination_country.or(to);
        }

        details
    }

    fn build_prompt(input: &AgentInput<'_>, details: &RemittanceDetails) -> LlmPrompt {
        let mut user = format!("User request: {}\n\nAnalyze this remittance request:\n", input.text);

        if let Some(amount) = details.amount {
            match details.currency.as_deref() {
                Some(currency) => user.push_str(&format!("- Amount: {:.2} {}\n", amount, currency)),
                None => user.push_str(&format!("- Amount: {:.2}\n", amount)),
            }
        }
        if let Some(from) = &details.source_country {
            user.push_str(&format!("- From: {}\n", from));
        }
        if let Some(to) = &details.destination_country {
            user.push_str(&format!("- To: {}\n", to));
        }

        user.push_str(
            "\nProvide cost analysis (fees, exchange rates), time estimates, risk assessment, \
             alternative options and compliance considerations.",
        );

        let system = format!(
            "You are a remittance and cross-border payment expert. Analyze the request for a \
             {level} user and answer in {language}.\n{format}",
            level = input.user_level,
            language = input.language,
            format = json_instruction(
                r#"{"summary": string, "estimated_fee": string, "estimated_delivery": string, "risks": [string]}"#
            ),
        );

        LlmPrompt {
            system,
            user,
            temperature: 0.1,
        }
    }
}

#[async_trait::async_trait]
impl Agent for RemittanceAgent {
    fn capability(&self) -> Capability {
        Capability::RemittanceAnalyze
    }

    fn description(&self) -> &'static str {
        "Analyzes cross-border transfer cost, timing and risk with a testnet fee estimate"
    }

    async fn invoke(&self, input: &AgentInput<'_>) -> Result<CapabilityResult> {
        let details = Self::resolve_details(input);
        let prompt = Self::build_prompt(input, &details);

        let mut result = complete(
            self.llm.as_ref(),
            Capability::RemittanceAnalyze,
            prompt,
            input,
            parse_remittance,
        )
        .await?;

        result.metadata.insert("transfer".into(), json!(details));

        // Advisory only: a testnet outage never fails the analysis
        match self
            .ledger
            .estimate(
                details.amount,
                details.source_country.as_deref(),
                details.destination_country.as_deref(),
            )
            .await
        {
            Ok(estimate) => {
                info!(network = %estimate.network, fee = estimate.fee, "Network estimate merged");
                result
                    .metadata
                    .insert("network_estimate".into(), json!(estimate));
            }
            Err(e) => {
                warn!(ledger = self.ledger.name(), "Network estimate unavailable: {}", e);
                result
                    .metadata
                    .insert("network_estimate_error".into(), json!(e.user_message()));
            }
        }

        Ok(result)
    }
}
