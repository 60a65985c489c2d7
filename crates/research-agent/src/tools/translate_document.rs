use research_agent_core::ModelClient;
use research_agent_core::tool::{Error as ToolError, Json, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::{Value, json};

fn default_language() -> String {
    "English".to_owned()
}

#[derive(Deserialize, JsonSchema)]
pub struct TranslateDocumentParameters {
    #[schemars(description = "The text to translate.")]
    #[serde(alias = "text")]
    document: String,
    #[schemars(description = "Language to translate into, default to English.")]
    #[serde(alias = "language", default = "default_language")]
    target_language: String,
}

/// A tool translating documents with the model.
pub struct TranslateDocumentTool {
    model_client: ModelClient,
    input_schema: Value,
}

impl TranslateDocumentTool {
    /// Creates a translation tool calling the given model.
    #[inline]
    pub fn new(model_client: ModelClient) -> Self {
        Self {
            model_client,
            input_schema: schema_for!(TranslateDocumentParameters).to_value(),
        }
    }
}

impl Tool for TranslateDocumentTool {
    type Input = Json<TranslateDocumentParameters>;

    fn name(&self) -> &str {
        "translate_document"
    }

    fn description(&self) -> &str {
        r#"
Translates a document into another language.
Input: a JSON object like {"document": "text to translate", "target_language": "German"}."#
    }

    fn input_schema(&self) -> Option<&Value> {
        Some(&self.input_schema)
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        Json(params): Json<TranslateDocumentParameters>,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let model_client = self.model_client.clone();
        async move {
            if params.document.trim().is_empty() {
                return Err(ToolError::invalid_input()
                    .with_reason("`document` must not be empty"));
            }
            let prompt = format!(
                "Translate the following document to {}. Only output the \
                 translation, nothing else:\n\n{}",
                params.target_language.trim(),
                params.document
            );
            let translation =
                model_client.complete(prompt).await.map_err(|err| {
                    ToolError::execution_error()
                        .with_reason(format!("translation failed: {err}"))
                })?;
            Ok(json!(translation.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use research_agent_core::tool::{ErrorKind, ToolInput};
    use research_agent_test_model::{
        PresetFailure, PresetResponse, TestModelProvider,
    };

    use super::*;

    fn tool(model_provider: &TestModelProvider) -> TranslateDocumentTool {
        TranslateDocumentTool::new(ModelClient::new(model_provider.clone()))
    }

    #[tokio::test]
    async fn test_translate() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_text_step(" Tesla baut Elektroautos.\n");

        let input = Json::parse(
            r#"{"text": "Tesla builds electric cars.", "language": "German"}"#,
        )
        .unwrap();
        let translation = tool(&model_provider).execute(input).await.unwrap();
        assert_eq!(translation, json!("Tesla baut Elektroautos."));

        let prompt = &model_provider.prompts()[0];
        assert!(prompt.starts_with("Translate the following document to German."));
        assert!(prompt.ends_with("\n\nTesla builds electric cars."));
    }

    #[tokio::test]
    async fn test_default_language() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_text_step("Hello");

        let input = Json::parse(r#"{"document": "Hallo"}"#).unwrap();
        tool(&model_provider).execute(input).await.unwrap();
        assert!(model_provider.prompts()[0].contains("to English."));
    }

    #[tokio::test]
    async fn test_model_failure() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response_step(
            PresetResponse::text("unused")
                .with_failures(0)
                .with_failure_kind(PresetFailure::Fatal),
        );

        let input = Json::parse(r#"{"document": "Hallo"}"#).unwrap();
        let err = tool(&model_provider).execute(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert!(err.reason().starts_with("translation failed"));
    }
}
