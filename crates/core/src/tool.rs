//! Tool call supports.

mod error;
mod input;
mod object;
mod registry;

use serde_json::Value;

pub use error::{Error, ErrorKind};
pub use input::{Json, ToolInput, parse_lenient_json};
pub use registry::{ToolDescriptor, ToolRegistry, ToolRegistryBuilder};

/// The result of a tool call.
///
/// Successful results are basic structured data: strings, numbers, lists
/// or string-keyed maps of those.
pub type ToolResult = Result<Value, Error>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain
/// any internal state. A registry holding the tool may be shared by many
/// tasks running at once.
///
/// The tool can be context-aware, meaning it can access additional
/// information about the current execution context, such as a model client
/// or a deny-list. To do this, make the context an immutable state of the
/// tool, which can be set during initialization, and copy it when
/// executing.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: ToolInput;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool, which is shown to the model.
    fn description(&self) -> &str;

    /// Returns the JSON schema of the input, if the tool takes JSON.
    fn input_schema(&self) -> Option<&Value> {
        None
    }

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}
