use std::error::Error as StdError;
use std::fmt::{self, Display};

use serde::Serialize;

use crate::model_client::ModelError;
use crate::prompt::PromptError;
use crate::transcript::Transcript;

/// How a task ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// The model produced a final answer.
    Succeeded,
    /// The iteration budget ran out first.
    StoppedByLimit,
    /// The task could not continue.
    Aborted,
}

/// Why a task was aborted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// The model failed, and retrying did not help.
    Model(ModelError),
    /// The prompt could not be built.
    Prompt(PromptError),
    /// Cancellation was requested.
    Cancelled,
    /// The iteration budget was zero.
    InvalidBudget,
}

impl Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Model(err) => write!(f, "model call failed ({err})"),
            AbortReason::Prompt(err) => write!(f, "{err}"),
            AbortReason::Cancelled => write!(f, "cancelled"),
            AbortReason::InvalidBudget => {
                write!(f, "the iteration budget must be at least 1")
            }
        }
    }
}

impl StdError for AbortReason {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AbortReason::Model(err) => Some(err),
            AbortReason::Prompt(err) => Some(err),
            _ => None,
        }
    }
}

/// The result of running a task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    /// How the task ended.
    pub status: TaskStatus,
    /// The final answer, or a best-effort summary if the task did not
    /// succeed. Never empty.
    pub answer: String,
    /// Number of completed model calls, retries excluded.
    pub iterations_used: usize,
    /// Everything that happened during the task.
    pub transcript: Transcript,
    /// Set when [`TaskOutcome::status`] is [`TaskStatus::Aborted`].
    #[serde(skip)]
    pub abort_reason: Option<AbortReason>,
}

impl TaskOutcome {
    /// Returns `true` if the task produced a final answer.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }
}
