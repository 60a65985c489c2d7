mod builder;
mod cancel;
mod outcome;
mod state;

use std::sync::Arc;

use tracing::Instrument;

use crate::config::AgentConfig;
use crate::model_client::ModelClient;
use crate::prompt::PromptBuilder;
use crate::tool::ToolRegistry;
use crate::transcript::Turn;
pub use builder::AgentBuilder;
pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use outcome::{AbortReason, TaskOutcome, TaskStatus};
use state::TaskRun;

type TurnHook = Box<dyn Fn(&Turn) + Send + Sync>;

/// An agent, which drives tasks to completion by alternating model calls
/// and tool invocations.
///
/// The agent itself holds no per-task state, each call to [`Agent::run`]
/// owns its own transcript. Cloning is cheap and clones share the model
/// client and the tool registry, so many tasks can run concurrently.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    model_client: ModelClient,
    registry: Arc<ToolRegistry>,
    prompt_builder: PromptBuilder,
    config: AgentConfig,
    on_turn: Option<TurnHook>,
}

impl Agent {
    /// Runs a task with the given iteration budget.
    ///
    /// This never fails: model errors, cancellation and an invalid budget
    /// are reported through [`TaskOutcome::status`].
    pub async fn run(
        &self,
        instruction: &str,
        max_iterations: usize,
    ) -> TaskOutcome {
        self.run_task(instruction, max_iterations, None).await
    }

    /// Runs a task with the configured iteration budget.
    #[inline]
    pub async fn run_default(&self, instruction: &str) -> TaskOutcome {
        self.run(instruction, self.inner.config.max_iterations).await
    }

    /// Runs a task that can be cancelled through the [`CancelHandle`]
    /// paired with `cancel`.
    ///
    /// Cancellation is observed before each iteration and while waiting
    /// for the model. A running tool is never interrupted.
    pub async fn run_with_cancel(
        &self,
        instruction: &str,
        max_iterations: usize,
        cancel: CancelSignal,
    ) -> TaskOutcome {
        self.run_task(instruction, max_iterations, Some(cancel))
            .await
    }

    /// Returns the tool registry shared by all tasks of this agent.
    #[inline]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.inner.registry
    }

    /// Returns the model client.
    #[inline]
    pub fn model_client(&self) -> &ModelClient {
        &self.inner.model_client
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    async fn run_task(
        &self,
        instruction: &str,
        max_iterations: usize,
        cancel: Option<CancelSignal>,
    ) -> TaskOutcome {
        let span = debug_span!("task", max_iterations);
        TaskRun::new(&self.inner, instruction, max_iterations, cancel)
            .run()
            .instrument(span)
            .await
    }

    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            model_client,
            tools,
            framing,
            config,
            on_turn,
        } = builder;

        let registry = tools.with_timeout(config.tool_timeout).build();
        let prompt_builder = framing
            .map(PromptBuilder::with_framing)
            .unwrap_or_default()
            .with_max_chars(config.max_prompt_chars);

        Self {
            inner: Arc::new(AgentInner {
                model_client,
                registry: Arc::new(registry),
                prompt_builder,
                config,
                on_turn,
            }),
        }
    }
}
