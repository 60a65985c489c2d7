//! Prompt assembly.

use std::fmt::{self, Display, Write as _};

use crate::tool::ToolDescriptor;
use crate::transcript::{Transcript, Turn};

/// The framing used when none is configured.
pub const DEFAULT_FRAMING: &str = include_str!("./prompt/framing.md");

const TOOLS_PLACEHOLDER: &str = "{{TOOLS}}";
const INSTRUCTION_PLACEHOLDER: &str = "{{INSTRUCTION}}";

/// An error building the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptError {
    /// The prompt grew beyond the configured limit.
    TooLong {
        /// Length of the prompt, in characters.
        len: usize,
        /// The configured limit.
        limit: usize,
    },
}

impl Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::TooLong { len, limit } => write!(
                f,
                "prompt is {len} characters long, exceeding the limit of {limit}"
            ),
        }
    }
}

impl std::error::Error for PromptError {}

/// Builds the prompt for the next model call.
///
/// The builder holds only the static framing, every call is a pure
/// function of the instruction, the tools and the transcript.
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    framing: String,
    max_chars: Option<usize>,
}

impl Default for PromptBuilder {
    #[inline]
    fn default() -> Self {
        Self::with_framing(DEFAULT_FRAMING)
    }
}

impl PromptBuilder {
    /// Creates a builder with a custom framing.
    ///
    /// `{{TOOLS}}` and `{{INSTRUCTION}}` in the framing are replaced with
    /// the tool catalogue and the task instruction. If the framing lacks
    /// `{{INSTRUCTION}}`, the instruction is appended as a question.
    #[inline]
    pub fn with_framing<S: Into<String>>(framing: S) -> Self {
        Self {
            framing: framing.into(),
            max_chars: None,
        }
    }

    /// Sets the maximum prompt length, in characters.
    #[inline]
    pub fn with_max_chars(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Renders the prompt.
    pub fn build<'a>(
        &self,
        instruction: &str,
        tools: impl IntoIterator<Item = ToolDescriptor<'a>>,
        transcript: &Transcript,
    ) -> Result<String, PromptError> {
        let mut prompt = self
            .framing
            .replace(TOOLS_PLACEHOLDER, &render_tools(tools));
        if prompt.contains(INSTRUCTION_PLACEHOLDER) {
            prompt = prompt.replace(INSTRUCTION_PLACEHOLDER, instruction.trim());
        } else {
            prompt.push_str(&format!("\nQuestion: {}\n", instruction.trim()));
        }
        if !prompt.ends_with('\n') {
            prompt.push('\n');
        }

        render_transcript(&mut prompt, transcript);
        prompt.push_str("Thought:");

        if let Some(limit) = self.max_chars {
            let len = prompt.chars().count();
            if len > limit {
                return Err(PromptError::TooLong { len, limit });
            }
        }
        Ok(prompt)
    }
}

fn render_tools<'a>(tools: impl IntoIterator<Item = ToolDescriptor<'a>>) -> String {
    let mut rendered = String::new();
    for tool in tools {
        let description = tool.description.split_whitespace().collect::<Vec<_>>();
        _ = writeln!(rendered, "- {}: {}", tool.name, description.join(" "));
        if let Some(schema) = tool.input_schema {
            _ = writeln!(rendered, "  Input JSON schema: {schema}");
        }
    }
    rendered.truncate(rendered.trim_end().len());
    rendered
}

fn render_transcript(prompt: &mut String, transcript: &Transcript) {
    for turn in transcript.turns() {
        _ = match turn {
            Turn::Thought(text) => writeln!(prompt, "Thought: {text}"),
            Turn::Action(request) => writeln!(
                prompt,
                "Action: {}\nAction Input: {}",
                request.tool_name, request.raw_input
            ),
            Turn::Observation(text) => writeln!(prompt, "Observation: {text}\n"),
            Turn::FinalAnswer(text) => writeln!(prompt, "Final Answer: {text}"),
            Turn::Notice(_) => Ok(()),
        };
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::parser::ActionRequest;

    fn tools(schema: &serde_json::Value) -> Vec<ToolDescriptor<'_>> {
        vec![
            ToolDescriptor {
                name: "get_company_info",
                description: "Get company info.\n  Input: company name.",
                input_schema: None,
            },
            ToolDescriptor {
                name: "translate_document",
                description: "Translate a document.",
                input_schema: Some(schema),
            },
        ]
    }

    #[test]
    fn test_build_initial_prompt() {
        let schema = json!({"type": "object"});
        let builder = PromptBuilder::with_framing(
            "Tools:\n{{TOOLS}}\n\nQuestion: {{INSTRUCTION}}",
        );
        let prompt = builder
            .build("  Brief me on Tesla ", tools(&schema), &Transcript::default())
            .unwrap();
        assert_eq!(
            prompt,
            "Tools:\n- get_company_info: Get company info. Input: company name.\n- translate_document: Translate a document.\n  Input JSON schema: {\"type\":\"object\"}\n\nQuestion: Brief me on Tesla\nThought:"
        );
    }

    #[test]
    fn test_build_with_transcript() {
        let schema = json!({});
        let mut transcript = Transcript::default();
        transcript.push(Turn::Thought("need data".to_owned()));
        transcript.push(Turn::Action(ActionRequest::new("get_company_info", "Tesla")));
        transcript.push(Turn::Notice("model call failed, retrying".to_owned()));
        transcript.push(Turn::Observation("{\"name\":\"Tesla\"}".to_owned()));

        let prompt = PromptBuilder::with_framing("Q: {{INSTRUCTION}}")
            .build("Tesla?", tools(&schema), &transcript)
            .unwrap();
        assert_eq!(
            prompt,
            "Q: Tesla?\nThought: need data\nAction: get_company_info\nAction Input: Tesla\nObservation: {\"name\":\"Tesla\"}\n\nThought:"
        );
    }

    #[test]
    fn test_missing_instruction_placeholder() {
        let prompt = PromptBuilder::with_framing("Be helpful.")
            .build("Tesla?", [], &Transcript::default())
            .unwrap();
        assert_eq!(prompt, "Be helpful.\nQuestion: Tesla?\nThought:");
    }

    #[test]
    fn test_default_framing() {
        let prompt = PromptBuilder::default()
            .build("Brief me on Apple", [], &Transcript::default())
            .unwrap();
        assert!(prompt.contains("Question: Brief me on Apple"));
        assert!(prompt.contains("Final Answer:"));
        assert!(prompt.ends_with("Thought:"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_too_long() {
        let err = PromptBuilder::with_framing("{{INSTRUCTION}}")
            .with_max_chars(Some(10))
            .build("a long instruction", [], &Transcript::default())
            .unwrap_err();
        assert_eq!(err, PromptError::TooLong { len: 27, limit: 10 });
    }
}
