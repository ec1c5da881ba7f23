//! Multilingual reply agent
//!
//! Answers in the language the user wrote in. This is the text stage for
//! voice requests: its reply is what gets spoken.

use super::{complete, Agent, AgentInput};
use crate::models::{Capability, CapabilityResult};
use crate::parsing::parse_reply;
use crate::providers::{LlmPrompt, LlmProvider};
use crate::Result;
use std::sync::Arc;

pub struct MultilingualReplyAgent {
    llm: Arc<dyn LlmProvider>,
}

impl MultilingualReplyAgent {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait::async_trait]
impl Agent for MultilingualReplyAgent {
    fn capability(&self) -> Capability {
        Capability::VoiceSynthesize
    }

    fn description(&self) -> &'static str {
        "Answers financial questions in the user's own language, ready to be spoken"
    }

    async fn invoke(&self, input: &AgentInput<'_>) -> Result<CapabilityResult> {
        let system = format!(
            "You are a multilingual financial assistant. The user is speaking in {language}.\n\
             Respond in the same language ({language}) with helpful financial guidance for a \
             {level} user. Keep it professional, clear and short enough to be read aloud. \
             Use plain sentences without markdown.",
            language = input.language,
            level = input.user_level,
        );

        let prompt = LlmPrompt {
            system,
            user: input.text.to_string(),
            temperature: 0.3,
        };

        complete(
            self.llm.as_ref(),
            Capability::VoiceSynthesize,
            prompt,
            input,
            parse_reply,
        )
        .await
    }
}
