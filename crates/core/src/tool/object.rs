use std::future::ready;
use std::pin::Pin;

use serde_json::Value;

use super::{Tool, ToolInput, ToolResult};

/// Type-erased [`Tool`], taking the raw action input.
pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn input_schema(&self) -> Option<&Value>;

    fn execute(
        &self,
        raw_input: &str,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;
}

pub(crate) struct ToolObjectImpl<T: Tool>(pub T);

impl<T: Tool> ToolObject for ToolObjectImpl<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn input_schema(&self) -> Option<&Value> {
        self.0.input_schema()
    }

    #[inline]
    fn execute(
        &self,
        raw_input: &str,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let input = match T::Input::parse(raw_input) {
            Ok(input) => input,
            Err(err) => {
                trace!("rejected input for `{}`: {err}", self.0.name());
                return Box::pin(ready(ToolResult::Err(err)));
            }
        };
        Box::pin(self.0.execute(input))
    }
}
