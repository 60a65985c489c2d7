use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use research_agent_model::{ModelResponse, ModelResponseEvent};

use crate::proto::{ChatCompletion, finish_reason};

/// A fully received chat completion, replayed as model response events.
pub struct OpenAIResponse {
    events: VecDeque<ModelResponseEvent>,
}

impl OpenAIResponse {
    /// Takes the first choice of the completion. A completion without any
    /// choice yields an empty message.
    pub(crate) fn from_completion(completion: ChatCompletion) -> Self {
        let mut events = VecDeque::with_capacity(2);
        let choice = completion.choices.into_iter().next();
        let reason = choice
            .as_ref()
            .and_then(|choice| choice.finish_reason.as_deref());
        let reason = finish_reason(reason);

        if let Some(content) = choice
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
        {
            events.push_back(ModelResponseEvent::MessageDelta(content));
        }
        events.push_back(ModelResponseEvent::Completed(reason));
        Self { events }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.get_mut().events.pop_front()))
    }
}
