use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use dbchat_model::{
    ErrorKind, FinishReason, ModelResponse, ModelResponseEvent,
    ProviderMessage, ToolCallRequest,
};
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::Error;
use crate::io::{EventReader, SseError};
use crate::proto::{ChatCompletionChunk, FunctionCall, Message, ToolCall};

#[derive(Default)]
struct PendingToolCall {
    index: u32,
    id: String,
    name: String,
    arguments: String,
}

impl PendingToolCall {
    fn to_request(&self) -> ToolCallRequest {
        let arguments = if self.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            // Malformed arguments are passed through as a string so the
            // tool reports the problem back to the model.
            serde_json::from_str(&self.arguments)
                .unwrap_or_else(|_| Value::String(self.arguments.clone()))
        };
        ToolCallRequest {
            id: self.id.clone(),
            name: self.name.clone(),
            arguments,
        }
    }
}

struct StreamState {
    reader: EventReader,
    id: Option<String>,
    content: String,
    tool_calls: Vec<PendingToolCall>,
    finish_reason: Option<FinishReason>,
    // Events decoded from the stream but not handed out yet.
    queued: VecDeque<ModelResponseEvent>,
    ended: bool,
}

impl StreamState {
    fn apply_chunk(&mut self, chunk: ChatCompletionChunk) {
        self.id.get_or_insert(chunk.id);
        for choice in chunk.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                self.content.push_str(&content);
                self.queued.push_back(ModelResponseEvent::TextDelta(content));
            }
            for delta in choice.delta.tool_calls.into_iter().flatten() {
                let pos = match self.tool_calls.iter().position(|t| t.index == delta.index) {
                    Some(pos) => pos,
                    None => {
                        self.tool_calls.push(PendingToolCall {
                            index: delta.index,
                            ..Default::default()
                        });
                        self.tool_calls.len() - 1
                    }
                };
                let pending = &mut self.tool_calls[pos];
                if let Some(id) = delta.id {
                    pending.id.push_str(&id);
                }
                if let Some(function) = delta.function {
                    pending.name.push_str(function.name.as_deref().unwrap_or_default());
                    pending
                        .arguments
                        .push_str(function.arguments.as_deref().unwrap_or_default());
                }
            }
            if let Some(reason) = choice.finish_reason {
                self.finish_reason = Some(match reason.as_str() {
                    "tool_calls" | "function_call" => FinishReason::ToolCalls,
                    "length" => FinishReason::Length,
                    _ => FinishReason::Stop,
                });
            }
        }
    }

    // Tool calls are only complete once the stream ends, so they are
    // released together with the finish reason.
    fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.tool_calls.sort_by_key(|t| t.index);
        for tool_call in &self.tool_calls {
            self.queued
                .push_back(ModelResponseEvent::ToolCall(tool_call.to_request()));
        }
        let reason = self.finish_reason.unwrap_or(if self.tool_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolCalls
        });
        self.queued.push_back(ModelResponseEvent::Finished(reason));
    }

    fn into_provider_message(self) -> Option<ProviderMessage> {
        let id = self.id?;
        let content = (!self.content.is_empty() || self.tool_calls.is_empty())
            .then_some(self.content);
        let tool_calls = self
            .tool_calls
            .into_iter()
            .map(|t| ToolCall {
                id: t.id,
                r#type: "function",
                function: FunctionCall {
                    name: t.name,
                    arguments: t.arguments,
                },
            })
            .collect();
        Some(ProviderMessage::new(
            id,
            Message::Assistant {
                content,
                tool_calls,
            },
        ))
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    /// Streamed chat completion.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        message: Option<ProviderMessage>,
    }
}

impl OpenAIResponse {
    pub(crate) fn new(reader: EventReader) -> Self {
        let state = StreamState {
            reader,
            id: None,
            content: String::new(),
            tool_calls: Vec::new(),
            finish_reason: None,
            queued: VecDeque::new(),
            ended: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
            message: None,
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = Error;

    fn poll_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        match ready!(fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => {
                *this.next_event_fut = Some(Box::pin(next_event(state)));
                Poll::Ready(Ok(Some(event)))
            }
            Ok((None, state)) => {
                *this.next_event_fut = None;
                *this.message = state.into_provider_message();
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_event_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }

    fn provider_message(&self) -> Option<ProviderMessage> {
        self.message.clone()
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    loop {
        if let Some(event) = state.queued.pop_front() {
            return Ok((Some(event), state));
        }
        if state.ended {
            return Ok((None, state));
        }

        let data = match state.reader.next_event().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                state.end();
                continue;
            }
            Err(SseError::Body(err)) if err.timed_out => {
                return Err(Error::new(err.message, ErrorKind::Timeout));
            }
            Err(err) => {
                return Err(Error::new(format!("{err}"), ErrorKind::Protocol));
            }
        };
        trace!("got sse data: {data}");
        if data == "[DONE]" {
            state.end();
            continue;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&data).map_err(|err| {
            Error::new(format!("malformed chunk: {err}"), ErrorKind::Protocol)
        })?;
        state.apply_chunk(chunk);
    }
}
