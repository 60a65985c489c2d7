use backoff::backoff::Backoff;
use research_agent_model::{ErrorKind, ModelRequest};
use tokio::time::{sleep, timeout};

use super::{AbortReason, AgentInner, CancelSignal, TaskOutcome, TaskStatus};
use crate::model_client::{ModelCompletion, ModelError};
use crate::parser::{ParseFailure, ParsedCompletion, parse_completion};
use crate::transcript::{Transcript, Turn};

/// Generation stops before the model can invent its own observation.
const STOP_SEQUENCE: &str = "Observation:";

#[derive(Debug)]
enum TaskEnd {
    Succeeded(String),
    StoppedByLimit,
    Aborted(AbortReason),
}

enum CallError {
    Model(ModelError),
    Cancelled,
}

/// A single task run. Owns the transcript until the outcome is produced.
pub(super) struct TaskRun<'a> {
    agent: &'a AgentInner,
    instruction: &'a str,
    max_iterations: usize,
    iterations: usize,
    transcript: Transcript,
    cancel: Option<CancelSignal>,
}

impl<'a> TaskRun<'a> {
    pub fn new(
        agent: &'a AgentInner,
        instruction: &'a str,
        max_iterations: usize,
        cancel: Option<CancelSignal>,
    ) -> Self {
        Self {
            agent,
            instruction,
            max_iterations,
            iterations: 0,
            transcript: Transcript::default(),
            cancel,
        }
    }

    pub async fn run(mut self) -> TaskOutcome {
        if self.max_iterations == 0 {
            warn!("refusing to run a task with a zero iteration budget");
            return self.finish(TaskEnd::Aborted(AbortReason::InvalidBudget));
        }

        loop {
            if let Some(end) = self.step().await {
                return self.finish(end);
            }
        }
    }

    /// Runs one iteration: prompt, model call, then either the final
    /// answer, a tool call, or a corrective observation.
    async fn step(&mut self) -> Option<TaskEnd> {
        if self.is_cancelled() {
            return Some(TaskEnd::Aborted(AbortReason::Cancelled));
        }

        let prompt = match self.agent.prompt_builder.build(
            self.instruction,
            self.agent.registry.descriptors(),
            &self.transcript,
        ) {
            Ok(prompt) => prompt,
            Err(err) => {
                error!("failed to build the prompt: {err}");
                return Some(TaskEnd::Aborted(AbortReason::Prompt(err)));
            }
        };

        let completion = match self.call_model(prompt).await {
            Ok(completion) => completion,
            Err(reason) => return Some(TaskEnd::Aborted(reason)),
        };
        self.iterations += 1;
        debug!(
            "iteration {}/{} completed: {:?}",
            self.iterations, self.max_iterations, completion.text
        );

        match parse_completion(&completion.text) {
            ParsedCompletion::FinalAnswer { answer, thought } => {
                self.record_thought(thought);
                self.record(Turn::FinalAnswer(answer.clone()));
                return Some(TaskEnd::Succeeded(answer));
            }
            ParsedCompletion::Action { request, thought } => {
                self.record_thought(thought);
                self.record(Turn::Action(request.clone()));
                let observation = self
                    .agent
                    .registry
                    .dispatch(&request.tool_name, &request.raw_input)
                    .await;
                let rendered =
                    observation.render(self.agent.config.observation_limit);
                self.record(Turn::Observation(rendered));
            }
            ParsedCompletion::Failure(failure) => {
                info!("could not parse the completion: {failure}");
                let text = completion.text.trim();
                if !text.is_empty() {
                    self.record(Turn::Thought(text.to_owned()));
                }
                self.record(Turn::Observation(corrective_observation(failure)));
            }
        }

        (self.iterations >= self.max_iterations)
            .then_some(TaskEnd::StoppedByLimit)
    }

    /// Calls the model, retrying transient failures within the same
    /// iteration.
    async fn call_model(
        &mut self,
        prompt: String,
    ) -> Result<ModelCompletion, AbortReason> {
        let agent = self.agent;
        let config = &agent.config;
        let request = ModelRequest::with_prompt(prompt).with_stop(STOP_SEQUENCE);
        let mut backoff = config.retry_backoff();
        let mut retries = 0;

        loop {
            let err = match self.send_once(request.clone()).await {
                Ok(completion) => return Ok(completion),
                Err(CallError::Cancelled) => return Err(AbortReason::Cancelled),
                Err(CallError::Model(err)) => err,
            };

            if !err.is_transient() || retries >= config.max_retries {
                error!("model call failed: {err}");
                self.record(Turn::Notice(format!("Model call failed: {err}")));
                return Err(AbortReason::Model(err));
            }

            retries += 1;
            let delay = backoff
                .next_backoff()
                .unwrap_or(config.retry_initial_interval);
            warn!("model call failed ({err}), retry {retries} in {delay:?}");
            self.record(Turn::Notice(format!(
                "Model call failed: {err}. Retrying in {}ms.",
                delay.as_millis()
            )));

            match &mut self.cancel {
                Some(cancel) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AbortReason::Cancelled),
                        _ = sleep(delay) => {}
                    }
                }
                None => sleep(delay).await,
            }
        }
    }

    async fn send_once(
        &mut self,
        request: ModelRequest,
    ) -> Result<ModelCompletion, CallError> {
        let agent = self.agent;
        let limit = agent.config.model_timeout;
        let call = timeout(limit, agent.model_client.send_request(request));

        let result = match &mut self.cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(CallError::Cancelled),
                    result = call => result,
                }
            }
            None => call.await,
        };

        match result {
            Ok(completion) => completion.map_err(CallError::Model),
            Err(_) => Err(CallError::Model(ModelError::new(
                ErrorKind::Timeout,
                format!("no completion within {}s", limit.as_secs_f32()),
            ))),
        }
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|cancel| cancel.is_cancelled())
    }

    fn record_thought(&mut self, thought: Option<String>) {
        if let Some(thought) = thought {
            self.record(Turn::Thought(thought));
        }
    }

    fn record(&mut self, turn: Turn) {
        trace!("new turn: {turn:?}");
        if let Some(on_turn) = &self.agent.on_turn {
            on_turn(&turn);
        }
        self.transcript.push(turn);
    }

    fn finish(self, end: TaskEnd) -> TaskOutcome {
        let (status, answer, abort_reason) = match end {
            TaskEnd::Succeeded(answer) => (TaskStatus::Succeeded, answer, None),
            TaskEnd::StoppedByLimit => {
                (TaskStatus::StoppedByLimit, self.partial_answer(), None)
            }
            TaskEnd::Aborted(reason) => (
                TaskStatus::Aborted,
                format!("Task aborted: {reason}."),
                Some(reason),
            ),
        };
        info!(
            "task finished with {status:?} after {} iterations",
            self.iterations
        );

        TaskOutcome {
            status,
            answer,
            iterations_used: self.iterations,
            transcript: self.transcript,
            abort_reason,
        }
    }

    /// The best-effort answer when the budget runs out: a notice, plus
    /// the most recent observation or thought.
    fn partial_answer(&self) -> String {
        let mut answer = format!(
            "No final answer was reached within {} iterations.",
            self.max_iterations
        );
        let observation = self
            .transcript
            .last_tool_observation()
            .or_else(|| self.transcript.last_observation());
        if let Some(observation) = observation {
            answer.push_str("\nLast observation: ");
            answer.push_str(observation);
        } else if let Some(thought) = self.transcript.last_thought() {
            answer.push_str("\nLast thought: ");
            answer.push_str(thought);
        }
        answer
    }
}

fn corrective_observation(failure: ParseFailure) -> String {
    format!(
        "Could not parse your response: {failure}. Reply with `Action:` and \
         `Action Input:` lines to use a tool, or with a `Final Answer:` line \
         to finish."
    )
}
