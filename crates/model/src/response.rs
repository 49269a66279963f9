use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProviderMessage;
use crate::provider::ModelProviderError;

/// A streamed model response.
pub trait ModelResponse: Sized + Send + 'static {
    /// Error type of the response.
    type Error: ModelProviderError;

    /// Polls for the next event.
    ///
    /// `Ready(Ok(Some(_)))` yields an event, `Ready(Ok(None))` marks the
    /// end of the response and `Ready(Err(_))` aborts it. Polling again
    /// after the end keeps returning `Ready(Ok(None))`.
    fn poll_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;

    /// Returns the complete assistant message in the provider's own
    /// representation, for replaying it in later requests.
    ///
    /// Only meaningful once the response has been fully drained.
    fn provider_message(&self) -> Option<ProviderMessage> {
        None
    }
}

/// Why the model stopped producing output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The answer is complete.
    Stop,
    /// The model wants tool results before continuing.
    ToolCalls,
    /// The output hit the provider's length limit.
    Length,
}

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call id, echoed back in the matching result.
    pub id: String,
    /// Name of the tool.
    pub name: String,
    /// Arguments object.
    pub arguments: Value,
}

/// An event of a [`ModelResponse`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ModelResponseEvent {
    /// A chunk of assistant text.
    TextDelta(String),
    /// A complete tool call request.
    ToolCall(ToolCallRequest),
    /// The response finished.
    Finished(FinishReason),
}
