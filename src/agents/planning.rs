//! Financial planning agent

use super::{complete, json_instruction, Agent, AgentInput};
use crate::models::{Capability, CapabilityResult, PlanningDetails};
use crate::parsing::parse_financial_plan;
use crate::providers::{LlmPrompt, LlmProvider};
use crate::Result;
use std::sync::Arc;

pub struct FinancialPlanningAgent {
    llm: Arc<dyn LlmProvider>,
}

impl FinancialPlanningAgent {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Only fields the user actually gave are listed. Missing income or
    /// expenses are left out rather than written as zero.
    fn profile_lines(details: &PlanningDetails) -> Vec<String> {
        let mut lines = Vec::new();
        if !details.goals.is_empty() {
            lines.push(format!("- Goals: {}", details.goals.join("; ")));
        }
        if let Some(income) = details.monthly_income {
            lines.push(format!("- Monthly Income: {:.2}", income));
        }
        if let Some(expenses) = details.monthly_expenses {
            lines.push(format!("- Monthly Expenses: {:.2}", expenses));
        }
        if let Some(timeline) = details.timeline.as_deref().filter(|t| !t.trim().is_empty()) {
            lines.push(format!("- Timeline: {}", timeline));
        }
        lines
    }

    fn build_prompt(input: &AgentInput<'_>) -> LlmPrompt {
        let mut user = format!("User request: {}\n", input.text);

        let lines = input.planning.map(Self::profile_lines).unwrap_or_default();
        if !lines.is_empty() {
            user.push_str("\nCreate a financial plan based on:\n");
            user.push_str(&lines.join("\n"));
            user.push('\n');
        }

        user.push_str(
            "\nProvide specific, actionable recommendations covering budget allocation, \
             savings strategy, investment options, risk assessment and timeline milestones. \
             Do not assume figures the user did not give.",
        );

        let system = format!(
            "You are a certified financial planner. Provide detailed, actionable financial \
             advice suited to a {level} user. Answer in {language}.\n{format}",
            level = input.user_level,
            language = input.language,
            format = json_instruction(
                r#"{"summary": string, "recommendations": [string], "milestones": [string]}"#
            ),
        );

        LlmPrompt {
            system,
            user,
            temperature: 0.2,
        }
    }
}

#[async_trait::async_trait]
impl Agent for FinancialPlanningAgent {
    fn capability(&self) -> Capability {
        Capability::FinancialPlan
    }

    fn description(&self) -> &'static str {
        "Builds a personal financial plan from goals, income, expenses and timeline"
    }

    async fn invoke(&self, input: &AgentInput<'_>) -> Result<CapabilityResult> {
        let prompt = Self::build_prompt(input);
        let mut result = complete(
            self.llm.as_ref(),
            Capability::FinancialPlan,
            prompt,
            input,
            parse_financial_plan,
        )
        .await?;

        if let Some(details) = input.planning {
            result
                .metadata
                .insert("goals_count".into(), details.goals.len().into());
        }
        Ok(result)
    }
}
