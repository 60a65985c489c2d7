use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::Instrument;

use crate::observation::Observation;
use crate::tool::object::{ToolObject, ToolObjectImpl};
use crate::tool::{Error, Tool};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Public view of a registered tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolDescriptor<'a> {
    /// Name of the tool.
    pub name: &'a str,
    /// Description shown to the model.
    pub description: &'a str,
    /// Schema of the JSON input, if the tool takes JSON.
    pub input_schema: Option<&'a Value>,
}

/// [`ToolRegistry`] builder.
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn ToolObject>>,
    timeout: Duration,
}

impl ToolRegistryBuilder {
    /// Registers a tool. A tool registered under an existing name replaces
    /// the earlier one.
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        let tool: Arc<dyn ToolObject> = Arc::new(ToolObjectImpl(tool));
        if let Some(existing) =
            self.tools.iter_mut().find(|t| t.name() == tool.name())
        {
            warn!("tool `{}` is registered twice, replacing", tool.name());
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
        self
    }

    /// Sets the time limit of a single tool invocation.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the registry.
    pub fn build(self) -> ToolRegistry {
        let index = self
            .tools
            .iter()
            .enumerate()
            .map(|(idx, tool)| (tool.name().to_owned(), idx))
            .collect();
        ToolRegistry {
            tools: self.tools,
            index,
            timeout: self.timeout,
        }
    }
}

impl Default for ToolRegistryBuilder {
    #[inline]
    fn default() -> Self {
        Self {
            tools: vec![],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A fixed set of tools, and the dispatch boundary between the agent and
/// them.
///
/// The registry is immutable once built. Wrap it in an [`Arc`] to share it
/// among agents and concurrently running tasks.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolObject>>,
    index: HashMap<String, usize>,
    timeout: Duration,
}

impl ToolRegistry {
    /// Creates a registry builder.
    #[inline]
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Returns the tools in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = ToolDescriptor<'_>> {
        self.tools.iter().map(|tool| ToolDescriptor {
            name: tool.name(),
            description: tool.description(),
            input_schema: tool.input_schema(),
        })
    }

    /// Returns the names of the registered tools.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|tool| tool.name())
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<&Arc<dyn ToolObject>> {
        if let Some(idx) = self.index.get(name) {
            return self.tools.get(*idx);
        }
        self.tools
            .iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(name))
    }

    /// Invokes the named tool with the raw action input.
    ///
    /// This never fails: unknown tools, rejected input, tool errors,
    /// panics and timeouts all come back as [`Observation::Failure`]. The
    /// input is handed to the tool's parser as data and is never
    /// interpreted in any other way.
    ///
    /// Must be called within a tokio runtime, the tool runs in its own
    /// task.
    pub async fn dispatch(&self, name: &str, raw_input: &str) -> Observation {
        let Some(tool) = self.lookup(name) else {
            warn!("tool not found: {name}");
            return Observation::Failure(Error::unknown_tool(name, self.names()));
        };

        let tool_name = tool.name().to_owned();
        let tool = Arc::clone(tool);
        let raw_input = raw_input.to_owned();
        trace!("spawning `{tool_name}` with input: {raw_input:?}");

        let task = tokio::spawn(
            async move { tool.execute(&raw_input).await }
                .instrument(debug_span!("tool execute", tool = %tool_name)),
        );
        let abort_handle = task.abort_handle();

        match timeout(self.timeout, task).await {
            Ok(Ok(result)) => Observation::from(result),
            Ok(Err(join_err)) => {
                error!("tool `{tool_name}` did not complete: {join_err}");
                let reason = if join_err.is_panic() {
                    format!("`{tool_name}` panicked")
                } else {
                    format!("`{tool_name}` was cancelled")
                };
                Observation::Failure(Error::execution_error().with_reason(reason))
            }
            Err(_) => {
                abort_handle.abort();
                warn!("tool `{tool_name}` timed out");
                Observation::Failure(Error::timeout().with_reason(format!(
                    "`{tool_name}` did not finish within {}s",
                    self.timeout.as_secs_f32()
                )))
            }
        }
    }
}
