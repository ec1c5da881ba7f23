//! Translation and explanation of financial content

use super::{complete, json_instruction, Agent, AgentInput};
use crate::models::{Capability, CapabilityResult};
use crate::parsing::parse_translation;
use crate::providers::{LlmPrompt, LlmProvider};
use crate::Result;
use std::sync::Arc;

pub struct TranslationAgent {
    llm: Arc<dyn LlmProvider>,
}

impl TranslationAgent {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    fn build_prompt(input: &AgentInput<'_>) -> LlmPrompt {
        let system = format!(
            "You are a financial translation and explanation expert. Your task is to:\n\
             1. Translate the provided financial content to {language}\n\
             2. Explain complex financial concepts in simple terms appropriate for a {level} level\n\
             3. Maintain accuracy while making content accessible\n\
             4. Include relevant examples when helpful\n\n\
             Write both the translation and the explanation in {language}.\n{format}",
            language = input.language,
            level = input.user_level,
            format = json_instruction(r#"{"translation": string, "explanation": string}"#),
        );

        LlmPrompt {
            system,
            user: format!(
                "Please translate and explain this financial content: {}",
                input.text
            ),
            temperature: 0.3,
        }
    }
}

#[async_trait::async_trait]
impl Agent for TranslationAgent {
    fn capability(&self) -> Capability {
        Capability::Translate
    }

    fn description(&self) -> &'static str {
        "Translates financial content and explains it at the user's level"
    }

    async fn invoke(&self, input: &AgentInput<'_>) -> Result<CapabilityResult> {
        let prompt = Self::build_prompt(input);
        complete(
            self.llm.as_ref(),
            Capability::Translate,
            prompt,
            input,
            parse_translation,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, ParsedOutput, UserLevel};
    use crate::providers::mock::MockLlm;

    fn input(text: &str) -> AgentInput<'_> {
        AgentInput {
            text,
            language: Language::French,
            user_level: UserLevel::Intermediate,
            planning: None,
            remittance: None,
        }
    }

    #[tokio::test]
    async fn test_prompt_embeds_language_and_level() {
        let llm = Arc::new(MockLlm::replying(
            "```json\n{\"translation\": \"Intérêt composé\", \"explanation\": \"Des intérêts sur les intérêts\"}\n```",
        ));
        let agent = TranslationAgent::new(llm.clone());

        let result = agent.invoke(&input("compound interest")).await.unwrap();

        let prompt = llm.last_prompt().unwrap();
        assert!(prompt.system.contains("to French"));
        assert!(prompt.system.contains("intermediate level"));
        assert!(prompt.user.contains("compound interest"));
        assert!(matches!(result.output, ParsedOutput::Translation { .. }));
        assert!(result.text_output.starts_with("Intérêt composé"));
        assert_eq!(result.metadata["language"], "fr");
    }

    #[tokio::test]
    async fn test_unconfigured_llm_degrades() {
        let agent = TranslationAgent::new(Arc::new(MockLlm::unconfigured()));
        let result = agent.invoke(&input("savings")).await.unwrap();
        assert!(result.is_degraded());
        assert!(result.text_output.contains("not configured"));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let agent = TranslationAgent::new(Arc::new(MockLlm::failing()));
        assert!(agent.invoke(&input("savings")).await.is_err());
    }
}
