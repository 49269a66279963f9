use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use dbchat_model::{
    FinishReason, ModelMessage, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, ProviderMessage,
    ToolCallRequest,
};
use tracing::Instrument;

type OnDelta = Box<dyn FnMut(&str) + Send>;
type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest, OnDelta) -> BoxedSendRequestFuture + Send + Sync>;

/// A type-erased, cheaply clonable handle to a model provider.
///
/// The agent and the tools that need the model themselves (the SQL query
/// checker) share one client without being generic over the provider.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    /// Wraps `provider`.
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        let handler_fn: HandlerFn = Arc::new(move |req, on_delta| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("sending request with {} messages", req.messages.len());
                    let resp_or_err = fut.await;
                    drain_response::<P>(resp_or_err, on_delta).await
                }
                .instrument(trace_span!("model request")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and waits for the complete response, calling
    /// `on_delta` with every piece of text as it streams in.
    ///
    /// # Cancel safety
    ///
    /// Dropping the future stops reading the response.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: impl FnMut(&str) + Send + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Box::new(on_delta)).await
    }

    /// Runs a single tool-less exchange and returns the answer text.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, Box<dyn ModelProviderError>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ModelMessage::System(system.to_owned()));
        }
        messages.push(ModelMessage::User(prompt.to_owned()));
        let req = ModelRequest {
            messages,
            tools: vec![],
        };
        let resp = self.send_request(req, |_| {}).await?;
        Ok(resp.text)
    }
}

/// A fully received model response.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    /// All text deltas concatenated.
    pub text: String,
    /// The provider's own copy of the assistant message, for replay.
    pub provider_message: Option<ProviderMessage>,
    /// Tool calls requested by the model, in order.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Why the model stopped, if it said so.
    pub finish_reason: Option<FinishReason>,
}

async fn drain_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    mut on_delta: OnDelta,
) -> SendRequestResult {
    let resp = resp_or_err.map_err(|err| {
        error!("model request failed: {err}");
        Box::new(err) as Box<dyn ModelProviderError>
    })?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    let mut resp = pin!(resp);
    loop {
        let event = poll_fn(|cx| resp.as_mut().poll_event(cx))
            .await
            .map_err(|err| {
                error!("model response failed: {err}");
                Box::new(err) as Box<dyn ModelProviderError>
            })?;
        let Some(event) = event else {
            break;
        };

        match event {
            ModelResponseEvent::TextDelta(delta) => {
                on_delta(&delta);
                text.push_str(&delta);
            }
            ModelResponseEvent::ToolCall(call) => tool_calls.push(call),
            ModelResponseEvent::Finished(reason) => finish_reason = Some(reason),
        }
    }

    trace!("response finished: {finish_reason:?}, {} tool calls", tool_calls.len());
    Ok(ModelClientResponse {
        text,
        provider_message: resp.provider_message(),
        tool_calls,
        finish_reason,
    })
}
