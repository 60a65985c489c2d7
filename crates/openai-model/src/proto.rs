use research_agent_model::{ModelFinishReason, ModelRequest};
use serde::{Deserialize, Serialize};

use crate::OpenAIConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletion {
    pub id: Option<String>,
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detailed { message: String },
    Plain(String),
}

impl ErrorBody {
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            ErrorBody::Detailed { message } | ErrorBody::Plain(message) => {
                message
            }
        }
    }
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![Message::User {
            content: req.prompt.clone(),
        }],
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        stop: req.stop.clone(),
        stream: false,
    }
}

#[inline]
pub fn finish_reason(reason: Option<&str>) -> ModelFinishReason {
    match reason {
        Some("length") => ModelFinishReason::Length,
        _ => ModelFinishReason::Stop,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest::with_prompt("Question: Brief me on Tesla")
            .with_stop("Observation:");
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .with_max_tokens(64)
            .with_temperature(0.5)
            .build();
        let expected = ChatCompletionRequest {
            model: "custom".to_owned(),
            messages: vec![Message::User {
                content: "Question: Brief me on Tesla".to_owned(),
            }],
            max_tokens: 64,
            temperature: 0.5,
            stop: vec!["Observation:".to_owned()],
            stream: false,
        };
        let openai_req = create_request(&request, &config);
        assert_eq!(openai_req, expected);
        assert_eq!(
            serde_json::to_value(&openai_req).unwrap(),
            json!({
                "model": "custom",
                "messages": [
                    {"role": "user", "content": "Question: Brief me on Tesla"}
                ],
                "max_tokens": 64,
                "temperature": 0.5,
                "stop": ["Observation:"],
                "stream": false
            })
        );
    }

    #[test]
    fn test_request_without_stop() {
        let config = OpenAIConfigBuilder::with_api_key("xxx").build();
        let openai_req =
            create_request(&ModelRequest::with_prompt("Hi"), &config);
        let value = serde_json::to_value(&openai_req).unwrap();
        assert!(value.get("stop").is_none());
    }

    #[test]
    fn test_parse_completion() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Final Answer: ok"},
                "finish_reason": "length"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3}
        }))
        .unwrap();
        let choice = &completion.choices[0];
        assert_eq!(choice.message.content.as_deref(), Some("Final Answer: ok"));
        assert_eq!(
            finish_reason(choice.finish_reason.as_deref()),
            ModelFinishReason::Length
        );
        assert_eq!(finish_reason(None), ModelFinishReason::Stop);
    }

    #[test]
    fn test_parse_error_body() {
        let detailed: ErrorResponse = serde_json::from_value(json!({
            "error": {"message": "Rate limit reached", "type": "requests"}
        }))
        .unwrap();
        assert_eq!(detailed.error.message(), "Rate limit reached");

        let plain: ErrorResponse =
            serde_json::from_value(json!({"error": "Model is overloaded"}))
                .unwrap();
        assert_eq!(plain.error.message(), "Model is overloaded");
    }
}
