use research_agent_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
}

/// The kind of failure a preset response produces before succeeding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetFailure {
    /// Fails with a rate limit error, which the agent may retry.
    #[default]
    RateLimited,
    /// Fails with an error that must not be retried.
    Fatal,
}

impl PresetFailure {
    #[inline]
    pub(crate) fn error_kind(self) -> ErrorKind {
        match self {
            PresetFailure::RateLimited => ErrorKind::RateLimitExceeded,
            PresetFailure::Fatal => ErrorKind::Other,
        }
    }
}

/// The preset response for one model call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
    /// What kind of failure to produce.
    #[serde(default)]
    pub failure_kind: PresetFailure,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
            failure_kind: PresetFailure::default(),
        }
    }

    /// Creates a `PresetResponse` that delivers `text` in a single delta.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Sets the kind of failure produced by [`Self::with_failures`].
    #[inline]
    pub fn with_failure_kind(mut self, kind: PresetFailure) -> Self {
        self.failure_kind = kind;
        self
    }

    /// Returns the concatenated completion text.
    pub fn completion(&self) -> String {
        self.events
            .iter()
            .map(|PresetEvent::MessageDelta(delta)| delta.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta("Thought: I should look it up.\n".to_string()),
            PresetEvent::MessageDelta("Action: get_company_info\n".to_string()),
            PresetEvent::MessageDelta("Action Input: Tesla".to_string()),
        ])
        .with_failures(2);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
        assert_eq!(
            deserialized.completion(),
            "Thought: I should look it up.\nAction: get_company_info\nAction Input: Tesla"
        );
    }

    #[test]
    fn test_failure_kind_defaults_to_rate_limit() {
        let deserialized: PresetResponse = serde_json::from_str(
            r#"{"events":[{"type":"message_delta","data":"hi"}],"failures":0}"#,
        )
        .unwrap();
        assert_eq!(deserialized.failure_kind, PresetFailure::RateLimited);
        assert!(deserialized.failure_kind.error_kind().is_transient());
    }
}
