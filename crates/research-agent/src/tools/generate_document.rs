use std::fmt::Write as _;
use std::future::ready;

use research_agent_core::tool::{
    Error as ToolError, Json, Tool, ToolResult, parse_lenient_json,
};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::{Map, Value, json};

const BRIEFING_TEMPLATE: &str = "briefing";

fn default_template() -> String {
    BRIEFING_TEMPLATE.to_owned()
}

#[derive(Deserialize, JsonSchema)]
pub struct GenerateDocumentParameters {
    #[schemars(description = "Template name, only \"briefing\" exists.")]
    #[serde(default = "default_template")]
    template: String,
    #[schemars(
        description = "Fields of the document, like company_name, industry or products."
    )]
    #[serde(alias = "content")]
    content_dict: Value,
}

/// A tool rendering briefing documents from collected facts.
pub struct GenerateDocumentTool {
    input_schema: Value,
}

impl GenerateDocumentTool {
    /// Creates a new document generation tool.
    #[inline]
    pub fn new() -> Self {
        Self {
            input_schema: schema_for!(GenerateDocumentParameters).to_value(),
        }
    }
}

impl Default for GenerateDocumentTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for GenerateDocumentTool {
    type Input = Json<GenerateDocumentParameters>;

    fn name(&self) -> &str {
        "generate_document"
    }

    fn description(&self) -> &str {
        r#"
Generates a formatted company briefing document.
Input: a JSON object like {"template": "briefing", "content_dict": {"company_name": "Tesla", "industry": "..."}}."#
    }

    fn input_schema(&self) -> Option<&Value> {
        Some(&self.input_schema)
    }

    fn execute(
        &self,
        Json(params): Json<GenerateDocumentParameters>,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let result = if params.template.trim().eq_ignore_ascii_case(BRIEFING_TEMPLATE)
        {
            let fields = content_fields(params.content_dict);
            Ok(json!(render_briefing(&fields)))
        } else {
            Err(ToolError::invalid_input().with_reason(format!(
                "unknown template `{}`, available templates: {BRIEFING_TEMPLATE}",
                params.template
            )))
        };
        ready(result)
    }
}

/// Models often pass the content as a string, possibly holding JSON.
fn content_fields(content: Value) -> Map<String, Value> {
    match content {
        Value::Object(map) => map,
        Value::String(text) => match parse_lenient_json(&text) {
            Some(Value::Object(map)) => map,
            _ => Map::from_iter([("info".to_owned(), Value::String(text))]),
        },
        Value::Null => Map::new(),
        other => Map::from_iter([("info".to_owned(), other)]),
    }
}

fn render_briefing(fields: &Map<String, Value>) -> String {
    let company_name = ["company_name", "name"]
        .iter()
        .find_map(|key| fields.get(*key))
        .map(render_value)
        .unwrap_or_else(|| "Unknown".to_owned());

    let mut document = format!("=== COMPANY BRIEFING: {company_name} ===\n\n");
    for (key, value) in fields {
        _ = writeln!(document, "{}: {}", title_case(key), render_value(value));
    }
    document.push_str("\n=== END OF BRIEFING ===");
    document
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// `risk_category` becomes `Risk Category`.
fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
