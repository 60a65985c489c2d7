//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use research_agent_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            let event_idx = this.event_idx;
            this.event_idx += 1;
            if let Some(event) = this.events.get(event_idx) {
                let PresetEvent::MessageDelta(msg) = event;
                return Poll::Ready(Ok(Some(
                    ModelResponseEvent::MessageDelta(msg.clone()),
                )));
            } else if event_idx == this.events.len() {
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
struct ScriptCursor {
    step: usize,
    failed_attempts: u64,
    prompts: Vec<String>,
    stops: Vec<Vec<String>>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each call. Every successful call consumes one
/// step, failed attempts stay on the same step. If there are no enough
/// steps in the script, an error will be returned, unless the provider
/// was told to repeat the last step.
///
/// Clones share the same cursor, so a clone handed to an agent can be
/// inspected afterwards through the original.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    repeat_last: bool,
    delay: Option<Duration>,
    cursor: Arc<Mutex<ScriptCursor>>,
}

impl TestModelProvider {
    /// Creates a provider that answers every call with `preset`.
    #[inline]
    pub fn repeating(preset: PresetResponse) -> Self {
        let mut provider = Self::default();
        provider.add_response_step(preset);
        provider.repeat_last = true;
        provider
    }

    #[inline]
    pub fn add_response_step(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    #[inline]
    pub fn add_text_step<S: Into<String>>(&mut self, text: S) {
        self.add_response_step(PresetResponse::text(text));
    }

    /// Sets the delay before each event of a response.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the number of requests received, including failed ones.
    pub fn request_count(&self) -> usize {
        self.with_cursor(|cursor| cursor.prompts.len())
    }

    /// Returns the prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.with_cursor(|cursor| cursor.prompts.clone())
    }

    /// Returns the stop sequences of each request received so far.
    pub fn stop_sequences(&self) -> Vec<Vec<String>> {
        self.with_cursor(|cursor| cursor.stops.clone())
    }

    fn with_cursor<R>(&self, f: impl FnOnce(&mut ScriptCursor) -> R) -> R {
        let mut cursor = match self.cursor.lock() {
            Ok(cursor) => cursor,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut cursor)
    }

    fn next_response(
        &self,
        req: &ModelRequest,
    ) -> Result<TestModelResponse, Error> {
        self.with_cursor(|cursor| {
            cursor.prompts.push(req.prompt.clone());
            cursor.stops.push(req.stop.clone());

            let step = match self.script.get(cursor.step) {
                Some(step) => step,
                None if self.repeat_last && !self.script.is_empty() => {
                    &self.script[self.script.len() - 1]
                }
                None => {
                    return Err(Error {
                        message: "no enough steps",
                        kind: ErrorKind::Other,
                    });
                }
            };

            if let Some(failures) = step.failures {
                if failures == 0 || cursor.failed_attempts < failures {
                    cursor.failed_attempts += 1;
                    return Err(Error {
                        message: "preset failure",
                        kind: step.failure_kind.error_kind(),
                    });
                }
            }

            cursor.step += 1;
            cursor.failed_attempts = 0;
            Ok(TestModelResponse {
                events: step.events.clone(),
                event_idx: 0,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            })
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.next_response(req))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use super::*;

    async fn collect_response(resp: TestModelResponse) -> String {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        loop {
            let event = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
                .await
                .unwrap()
                .unwrap();
            match event {
                ModelResponseEvent::Completed(_) => break,
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
            }
        }
        msg
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_response_step(PresetResponse::with_events([
            PresetEvent::MessageDelta("Thought: need data\n".to_owned()),
            PresetEvent::MessageDelta("Action: get_company_info\n".to_owned()),
            PresetEvent::MessageDelta("Action Input: Tesla".to_owned()),
        ]));
        provider.add_text_step("Final Answer: done");

        let req = ModelRequest::with_prompt("Question: brief me on Tesla");
        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(
            collect_response(resp).await,
            "Thought: need data\nAction: get_company_info\nAction Input: Tesla"
        );

        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(collect_response(resp).await, "Final Answer: done");

        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_failures_before_success() {
        let mut provider = TestModelProvider::default();
        provider.add_response_step(PresetResponse::text("ok").with_failures(1));

        let req = ModelRequest::with_prompt("hi").with_stop("Observation:");
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);

        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(collect_response(resp).await, "ok");
        assert_eq!(provider.stop_sequences(), vec![vec!["Observation:"]; 2]);
    }

    #[tokio::test]
    async fn test_repeating() {
        let provider =
            TestModelProvider::repeating(PresetResponse::text("Thought: hmm"));
        let clone = provider.clone();
        for _ in 0..3 {
            let req = ModelRequest::with_prompt("again");
            let resp = clone.send_request(&req).await.unwrap();
            assert_eq!(collect_response(resp).await, "Thought: hmm");
        }
        assert_eq!(provider.request_count(), 3);
        assert_eq!(provider.prompts(), vec!["again"; 3]);
    }
}
