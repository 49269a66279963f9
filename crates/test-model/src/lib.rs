//! A scripted fake model for tests.
//!
//! Every call to [`ModelProvider::send_request`] consumes the next step of
//! a FIFO script shared by all clones of the provider, so a test can queue
//! the exact replies an agent is going to receive and then inspect the
//! requests it actually sent.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use dbchat_model::{
    ErrorKind, FinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent, ProviderMessage, ToolCallRequest,
};
use serde_json::Value;
use tokio::time::{Sleep, sleep};

/// Error returned by [`ScriptedProvider`].
#[derive(Clone, Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

enum Step {
    Reply(Vec<ModelResponseEvent>),
    Failure(Error),
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    requests: Vec<ModelRequest>,
    next_id: u64,
}

/// A fake provider replaying queued replies.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    /// Queues a reply made of the given events. A trailing
    /// [`ModelResponseEvent::Finished`] is added when missing.
    pub fn push_reply(&self, events: impl Into<Vec<ModelResponseEvent>>) {
        let mut events = events.into();
        if !matches!(events.last(), Some(ModelResponseEvent::Finished(_))) {
            let has_tool_call = events
                .iter()
                .any(|e| matches!(e, ModelResponseEvent::ToolCall(_)));
            events.push(ModelResponseEvent::Finished(if has_tool_call {
                FinishReason::ToolCalls
            } else {
                FinishReason::Stop
            }));
        }
        self.lock().steps.push_back(Step::Reply(events));
    }

    /// Queues a plain text answer.
    pub fn push_text(&self, text: &str) {
        self.push_reply([ModelResponseEvent::TextDelta(text.to_owned())]);
    }

    /// Queues a reply requesting a single tool call.
    pub fn push_tool_call(&self, id: &str, name: &str, arguments: Value) {
        self.push_reply([ModelResponseEvent::ToolCall(ToolCallRequest {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments,
        })]);
    }

    /// Queues a failing request.
    pub fn push_failure(&self, kind: ErrorKind, message: &str) {
        self.lock().steps.push_back(Step::Failure(Error {
            message: message.to_owned(),
            kind,
        }));
    }

    /// Delays every event by `delay`.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Returns how many steps are still queued.
    pub fn remaining(&self) -> usize {
        self.lock().steps.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the script from others.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ModelProvider for ScriptedProvider {
    type Error = Error;
    type Response = ScriptedResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.lock();
        script.requests.push(req.clone());
        script.next_id += 1;
        let id = format!("scripted-{}", script.next_id);

        let result = match script.steps.pop_front() {
            Some(Step::Reply(events)) => Ok(ScriptedResponse {
                id,
                events: events.into(),
                text: String::new(),
                delay: self.delay,
                sleep: None,
                done: false,
            }),
            Some(Step::Failure(err)) => Err(err),
            None => Err(Error {
                message: "script exhausted".to_owned(),
                kind: ErrorKind::Other,
            }),
        };
        ready(result)
    }
}

/// Response produced by [`ScriptedProvider`].
pub struct ScriptedResponse {
    id: String,
    events: VecDeque<ModelResponseEvent>,
    text: String,
    delay: Option<Duration>,
    sleep: Option<Pin<Box<Sleep>>>,
    done: bool,
}

impl ModelResponse for ScriptedResponse {
    type Error = Error;

    fn poll_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if let Some(delay) = this.delay {
            let timer = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
            ready!(timer.as_mut().poll(cx));
            this.sleep = None;
        }

        let Some(event) = this.events.pop_front() else {
            this.done = true;
            return Poll::Ready(Ok(None));
        };
        if let ModelResponseEvent::TextDelta(delta) = &event {
            this.text.push_str(delta);
        }
        Poll::Ready(Ok(Some(event)))
    }

    fn provider_message(&self) -> Option<ProviderMessage> {
        self.done
            .then(|| ProviderMessage::new(self.id.clone(), self.text.clone()))
    }
}
