use std::sync::Arc;

use research_agent_core::transcript::Turn;
use research_agent_core::{
    Agent, AgentBuilder, AgentConfig, CancelSignal, ModelClient, TaskOutcome,
};
use research_agent_model::ModelProvider;

use crate::redact::Redactor;
use crate::tools::*;

/// A research assistant builder.
///
/// See [`ResearchAssistant`].
pub struct ResearchAssistantBuilder {
    agent_builder: AgentBuilder,
    model_client: ModelClient,
    redactor: Redactor,
    redact_answer: bool,
}

impl ResearchAssistantBuilder {
    /// Creates an assistant builder with a specified model provider.
    ///
    /// The provider drives the agent and also serves translations.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let model_client = ModelClient::new(provider);
        let agent_builder = AgentBuilder::with_model_client(model_client.clone());
        Self {
            agent_builder,
            model_client,
            redactor: Redactor::default(),
            redact_answer: false,
        }
    }

    /// Replaces the agent configuration.
    #[inline]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.agent_builder = self.agent_builder.with_config(config);
        self
    }

    /// Sets the default iteration budget.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.agent_builder =
            self.agent_builder.with_max_iterations(max_iterations);
        self
    }

    /// Replaces the default deny-list of the security filter.
    #[inline]
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Also redacts the answer of every task after the agent returns,
    /// whether or not the model used the security filter. Off by default.
    #[inline]
    pub fn with_answer_redaction(mut self, enabled: bool) -> Self {
        self.redact_answer = enabled;
        self
    }

    /// Attaches a callback to be invoked with every transcript turn.
    #[inline]
    pub fn on_turn(
        mut self,
        on_turn: impl Fn(&Turn) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_turn(on_turn);
        self
    }

    /// Builds a new assistant.
    pub fn build(self) -> ResearchAssistant {
        let redactor = Arc::new(self.redactor);
        let agent = self
            .agent_builder
            .with_tool(CompanyInfoTool)
            .with_tool(WebSearchTool)
            .with_tool(GenerateDocumentTool::new())
            .with_tool(TranslateDocumentTool::new(self.model_client))
            .with_tool(SecurityFilterTool::new(Arc::clone(&redactor)))
            .build();

        ResearchAssistant {
            agent,
            redactor,
            redact_answer: self.redact_answer,
        }
    }
}

/// A research assistant, which answers instructions like "Generate a
/// company briefing on Tesla in German" with the research tools.
///
/// The assistant is basically a wrapper around [`Agent`], cloning it is
/// cheap and tasks may run concurrently.
#[derive(Clone)]
pub struct ResearchAssistant {
    agent: Agent,
    redactor: Arc<Redactor>,
    redact_answer: bool,
}

impl ResearchAssistant {
    /// Runs an instruction with the configured iteration budget.
    pub async fn run(&self, instruction: &str) -> TaskOutcome {
        let outcome = self.agent.run_default(instruction).await;
        self.post_process(outcome)
    }

    /// Runs an instruction that can be cancelled.
    pub async fn run_with_cancel(
        &self,
        instruction: &str,
        cancel: CancelSignal,
    ) -> TaskOutcome {
        let max_iterations = self.agent.config().max_iterations;
        let outcome = self
            .agent
            .run_with_cancel(instruction, max_iterations, cancel)
            .await;
        self.post_process(outcome)
    }

    /// Returns the underlying agent.
    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    fn post_process(&self, mut outcome: TaskOutcome) -> TaskOutcome {
        if self.redact_answer && self.redactor.is_match(&outcome.answer) {
            debug!("redacting the answer");
            outcome.answer = self.redactor.redact(&outcome.answer).into_owned();
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use research_agent_core::TaskStatus;
    use research_agent_test_model::TestModelProvider;

    use super::*;

    #[tokio::test]
    async fn test_registered_tools() {
        let assistant =
            ResearchAssistantBuilder::with_model_provider(TestModelProvider::default())
                .build();
        let names = assistant.agent().registry().names().collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "get_company_info",
                "mock_web_search",
                "generate_document",
                "translate_document",
                "security_filter",
            ]
        );
    }

    #[tokio::test]
    async fn test_answer_redaction() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_text_step("Final Answer: Project Falcon is on track.");
        model_provider.add_text_step("Final Answer: Project Falcon is on track.");

        let plain = ResearchAssistantBuilder::with_model_provider(
            model_provider.clone(),
        )
        .build();
        let outcome = plain.run("Status?").await;
        assert_eq!(outcome.answer, "Project Falcon is on track.");

        let redacting =
            ResearchAssistantBuilder::with_model_provider(model_provider)
                .with_answer_redaction(true)
                .build();
        let outcome = redacting.run("Status?").await;
        assert_eq!(outcome.status, TaskStatus::Succeeded);
        assert_eq!(outcome.answer, "[REDACTED] is on track.");
    }

    #[tokio::test]
    async fn test_briefing_workflow() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_text_step(
            "Thought: I need company data.\nAction: get_company_info\nAction Input: \"Tesla\"",
        );
        model_provider.add_text_step(
            r#"Action: generate_document
Action Input: {"template": "briefing", "content_dict": {"company_name": "Tesla", "ceo": "Elon Musk", "notes": "Project Falcon is Internal-Only"}}"#,
        );
        model_provider.add_text_step(
            "Action: security_filter\nAction Input: Tesla notes: Project Falcon is Internal-Only",
        );
        model_provider.add_text_step("Final Answer: Tesla notes: [REDACTED] is [REDACTED]");

        let assistant =
            ResearchAssistantBuilder::with_model_provider(model_provider.clone())
                .build();
        let outcome = assistant.run("Generate a company briefing on Tesla").await;

        assert_eq!(outcome.status, TaskStatus::Succeeded);
        assert_eq!(outcome.iterations_used, 4);
        let observations = outcome
            .transcript
            .turns()
            .iter()
            .filter_map(|turn| match turn {
                Turn::Observation(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(observations.len(), 3);
        assert!(observations[0].contains("Elon Musk"));
        assert!(observations[1].starts_with("=== COMPANY BRIEFING: Tesla ==="));
        assert_eq!(observations[2], "Tesla notes: [REDACTED] is [REDACTED]");
        assert!(model_provider.prompts()[3].contains("[REDACTED] is [REDACTED]"));
    }

    #[tokio::test]
    async fn test_custom_deny_list() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_text_step(
            "Action: security_filter\nAction Input: Codename Bluebird, SECRET",
        );
        model_provider.add_text_step("Final Answer: done");

        let assistant =
            ResearchAssistantBuilder::with_model_provider(model_provider)
                .with_redactor(Redactor::new(["Bluebird"]).unwrap())
                .build();
        let outcome = assistant.run("Filter it").await;
        assert_eq!(
            outcome.transcript.last_observation(),
            Some("Codename [REDACTED], SECRET")
        );
    }
}
