use std::future::ready;
use std::sync::Arc;

use research_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use serde_json::json;

use crate::redact::Redactor;

/// A tool redacting sensitive terms from a document before it is shared.
pub struct SecurityFilterTool {
    redactor: Arc<Redactor>,
}

impl SecurityFilterTool {
    /// Creates a filter tool using the given deny-list.
    #[inline]
    pub fn new(redactor: Arc<Redactor>) -> Self {
        Self { redactor }
    }
}

impl Default for SecurityFilterTool {
    #[inline]
    fn default() -> Self {
        Self::new(Arc::default())
    }
}

impl Tool for SecurityFilterTool {
    type Input = String;

    fn name(&self) -> &str {
        "security_filter"
    }

    fn description(&self) -> &str {
        r#"
Redacts sensitive and internal-only terms from a document. Always run documents
through this tool before presenting them.
Input: the document text."#
    }

    fn execute(
        &self,
        document: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let result = if document.is_empty() {
            Err(ToolError::invalid_input().with_reason("no document to filter"))
        } else {
            Ok(json!(self.redactor.redact(&document)))
        };
        ready(result)
    }
}
