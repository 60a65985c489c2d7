//! Rendering tool results back into transcript text.

use serde_json::Value;

use crate::tool::Error as ToolError;

/// The outcome of dispatching one action.
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    /// The structured result returned by the tool.
    Output(Value),
    /// The tool could not be invoked, or failed.
    Failure(ToolError),
}

impl Observation {
    /// Returns `true` if this is a failure.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Observation::Failure(_))
    }

    /// Renders the observation as text of at most `limit` characters,
    /// plus a truncation marker if anything was cut.
    pub fn render(&self, limit: usize) -> String {
        let text = match self {
            Observation::Output(Value::String(text)) => text.trim().to_owned(),
            Observation::Output(value) => value.to_string(),
            Observation::Failure(err) => format!("Error: {err}"),
        };
        truncate_text(&text, limit)
    }
}

impl From<crate::tool::ToolResult> for Observation {
    #[inline]
    fn from(result: crate::tool::ToolResult) -> Self {
        match result {
            Ok(value) => Observation::Output(value),
            Err(err) => Observation::Failure(err),
        }
    }
}

/// Cuts `text` to `limit` characters on a char boundary, appending a
/// marker with the number of characters dropped.
pub fn truncate_text(text: &str, limit: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(limit) else {
        return text.to_owned();
    };
    let dropped = text[cut..].chars().count();
    format!("{}... [truncated {dropped} characters]", &text[..cut])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_output() {
        let obs = Observation::Output(json!("  Tesla is an EV maker.\n"));
        assert_eq!(obs.render(100), "Tesla is an EV maker.");

        let obs = Observation::Output(json!({"name": "Tesla"}));
        assert_eq!(obs.render(100), r#"{"name":"Tesla"}"#);

        let obs = Observation::Output(json!(["a", "b"]));
        assert_eq!(obs.render(100), r#"["a","b"]"#);
    }

    #[test]
    fn test_render_failure() {
        let obs = Observation::Failure(
            ToolError::execution_error().with_reason("database offline"),
        );
        assert!(obs.is_failure());
        assert_eq!(obs.render(100), "Error: Execution error: database offline");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exactly10!", 10), "exactly10!");
        assert_eq!(
            truncate_text("0123456789abc", 10),
            "0123456789... [truncated 3 characters]"
        );
        // Multi-byte characters are never split.
        assert_eq!(truncate_text("ääää", 2), "ää... [truncated 2 characters]");
    }

    #[test]
    fn test_render_is_bounded() {
        let obs = Observation::Output(json!("x".repeat(5000)));
        let rendered = obs.render(2000);
        assert!(rendered.starts_with(&"x".repeat(2000)));
        assert!(rendered.ends_with("[truncated 3000 characters]"));
    }
}
