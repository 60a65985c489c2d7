use research_agent_model::ModelProvider;

use super::{Agent, TurnHook};
use crate::config::AgentConfig;
use crate::model_client::ModelClient;
use crate::tool::{Tool, ToolRegistryBuilder};
use crate::transcript::Turn;

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(super) model_client: ModelClient,
    pub(super) tools: ToolRegistryBuilder,
    pub(super) framing: Option<String>,
    pub(super) config: AgentConfig,
    pub(super) on_turn: Option<TurnHook>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a new builder with an existing model client, which may be
    /// shared with tools.
    #[inline]
    pub fn with_model_client(model_client: ModelClient) -> Self {
        Self {
            model_client,
            tools: ToolRegistryBuilder::default(),
            framing: None,
            config: AgentConfig::default(),
            on_turn: None,
        }
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools = self.tools.with_tool(tool);
        self
    }

    /// Replaces the default framing of the prompt.
    ///
    /// See [`crate::prompt::PromptBuilder::with_framing`] for the
    /// placeholders.
    #[inline]
    pub fn with_framing<S: Into<String>>(mut self, framing: S) -> Self {
        self.framing = Some(framing.into());
        self
    }

    /// Replaces the whole configuration.
    #[inline]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the iteration budget used by [`Agent::run_default`].
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Attaches a callback invoked with every turn appended to a
    /// transcript, in order.
    ///
    /// The callback runs inline in the task, it should return quickly.
    #[inline]
    pub fn on_turn(
        mut self,
        on_turn: impl Fn(&Turn) + Send + Sync + 'static,
    ) -> Self {
        self.on_turn = Some(Box::new(on_turn));
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}
