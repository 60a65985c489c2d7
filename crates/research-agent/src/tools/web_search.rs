use std::future::ready;

use research_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use serde_json::json;

use super::company_key;

const TESLA_HEADLINES: &[&str] = &[
    "Tesla announces record Q4 deliveries of 484,000 vehicles",
    "Tesla partners with Panasonic for battery production",
    "Tesla Cybertruck production ramps up at Gigafactory Texas",
    "Tesla expands Supercharger network to 50,000 stations globally",
];

const APPLE_HEADLINES: &[&str] = &[
    "Apple launches Vision Pro mixed reality headset",
    "Apple partners with OpenAI for AI features in iOS",
    "Apple reports strong iPhone 15 sales in Q4",
    "Apple expands services revenue to record $85 billion",
];

/// Searches the web for recent news, products and partnerships of a
/// company. Backed by canned results.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSearchTool;

impl Tool for WebSearchTool {
    type Input = String;

    fn name(&self) -> &str {
        "mock_web_search"
    }

    fn description(&self) -> &str {
        r#"
Searches the web for public news about a company's products and partnerships.
Input: the company name, e.g. Apple."#
    }

    fn execute(
        &self,
        query: String,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let result = match company_key(&query).as_str() {
            "" => Err(ToolError::invalid_input()
                .with_reason("expected a company name, e.g. Apple")),
            "tesla" => Ok(json!(TESLA_HEADLINES)),
            "apple" => Ok(json!(APPLE_HEADLINES)),
            _ => Ok(json!([
                format!("{query} partners with Company X"),
                format!("{query} launches new product"),
            ])),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn test_search() {
        let results = WebSearchTool.execute("Tesla".to_owned()).await.unwrap();
        let Value::Array(headlines) = results else {
            panic!("expected a list");
        };
        assert_eq!(headlines.len(), 4);
        assert_eq!(headlines[1], json!(TESLA_HEADLINES[1]));

        let results = WebSearchTool.execute("Acme".to_owned()).await.unwrap();
        assert_eq!(
            results,
            json!(["Acme partners with Company X", "Acme launches new product"])
        );
    }
}
