//! Transcript-related types.

use serde::Serialize;

use crate::parser::ActionRequest;

/// The ordered history of one task run.
///
/// The agent owns the transcript while the task runs and hands it to the
/// caller in the outcome. Turns are only ever appended.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

/// A turn in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Turn {
    /// Reasoning text from the model.
    Thought(String),
    /// A tool invocation requested by the model.
    Action(ActionRequest),
    /// The rendered result of an action, or a corrective message.
    Observation(String),
    /// The answer ending the task.
    FinalAnswer(String),
    /// A system-level event, such as a failed model call. Notices are
    /// kept for the caller but never shown to the model.
    Notice(String),
}

impl Transcript {
    #[inline]
    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Returns the turns in order.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the most recent observation.
    pub fn last_observation(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|turn| match turn {
            Turn::Observation(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Returns the most recent observation that answered a tool call,
    /// skipping corrective observations after unparseable completions.
    pub fn last_tool_observation(&self) -> Option<&str> {
        self.turns.windows(2).rev().find_map(|pair| match pair {
            [Turn::Action(_), Turn::Observation(text)] => Some(text.as_str()),
            _ => None,
        })
    }

    /// Returns the most recent thought.
    pub fn last_thought(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|turn| match turn {
            Turn::Thought(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_items() {
        let mut transcript = Transcript::default();
        assert!(transcript.is_empty());
        assert_eq!(transcript.last_observation(), None);

        transcript.push(Turn::Thought("first".to_owned()));
        transcript.push(Turn::Observation("one".to_owned()));
        transcript.push(Turn::Thought("second".to_owned()));
        transcript.push(Turn::Notice("retrying".to_owned()));

        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.last_observation(), Some("one"));
        assert_eq!(transcript.last_thought(), Some("second"));
        assert_eq!(transcript.last_tool_observation(), None);
    }

    #[test]
    fn test_last_tool_observation() {
        let mut transcript = Transcript::default();
        transcript.push(Turn::Action(ActionRequest::new(
            "get_company_info",
            "Tesla",
        )));
        transcript.push(Turn::Observation("CEO: Elon Musk".to_owned()));
        transcript.push(Turn::Thought("gibberish".to_owned()));
        transcript.push(Turn::Observation("Could not parse".to_owned()));

        assert_eq!(transcript.last_observation(), Some("Could not parse"));
        assert_eq!(transcript.last_tool_observation(), Some("CEO: Elon Musk"));
    }

    #[test]
    fn test_serialize() {
        let mut transcript = Transcript::default();
        transcript.push(Turn::Action(ActionRequest::new(
            "get_company_info",
            "Tesla",
        )));
        transcript.push(Turn::FinalAnswer("done".to_owned()));
        assert_eq!(
            serde_json::to_string(&transcript).unwrap(),
            r#"{"turns":[{"kind":"action","text":{"tool_name":"get_company_info","raw_input":"Tesla"}},{"kind":"final_answer","text":"done"}]}"#
        );
    }
}
