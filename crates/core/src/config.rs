//! Agent configuration.

use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use serde::{Deserialize, Deserializer};

/// Limits and policies of an agent.
///
/// Durations are given in milliseconds when deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Iteration budget used by [`crate::Agent::run_default`].
    pub max_iterations: usize,
    /// Maximum length of a rendered observation, in characters.
    pub observation_limit: usize,
    /// Time limit of a single model call.
    #[serde(rename = "model_timeout_ms", deserialize_with = "millis")]
    pub model_timeout: Duration,
    /// Time limit of a single tool invocation.
    #[serde(rename = "tool_timeout_ms", deserialize_with = "millis")]
    pub tool_timeout: Duration,
    /// How many times a model call failing with a transient error is
    /// retried within one iteration.
    pub max_retries: u32,
    /// Delay before the first retry, later retries back off
    /// exponentially.
    #[serde(rename = "retry_initial_interval_ms", deserialize_with = "millis")]
    pub retry_initial_interval: Duration,
    /// Maximum prompt length, in characters.
    pub max_prompt_chars: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            observation_limit: 2000,
            model_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(30),
            max_retries: 1,
            retry_initial_interval: Duration::from_millis(500),
            max_prompt_chars: None,
        }
    }
}

impl AgentConfig {
    pub(crate) fn retry_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry_initial_interval)
            .with_max_interval(self.model_timeout)
            .with_max_elapsed_time(None)
            .build()
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use backoff::backoff::Backoff;

    use super::*;

    #[test]
    fn test_deserialize_partial() {
        let config: AgentConfig = serde_json::from_str(
            r#"{"max_iterations": 3, "model_timeout_ms": 1500}"#,
        )
        .unwrap();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.model_timeout, Duration::from_millis(1500));
        assert_eq!(config.tool_timeout, AgentConfig::default().tool_timeout);
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_retry_backoff_is_bounded() {
        let config = AgentConfig {
            retry_initial_interval: Duration::from_millis(100),
            model_timeout: Duration::from_secs(1),
            ..Default::default()
        };
        let mut backoff = config.retry_backoff();
        for _ in 0..20 {
            let delay = backoff.next_backoff().unwrap();
            // Randomization may add up to half of the interval.
            assert!(delay <= Duration::from_millis(1500));
        }
    }
}
