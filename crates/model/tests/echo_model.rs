//! Implements the protocol with a tiny echoing model to make sure the
//! traits compose the way the agent drives them.

use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::task::{Context, Poll};

use dbchat_model::{
    ErrorKind, FinishReason, ModelMessage, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};

#[derive(Debug)]
struct EchoError(ErrorKind);

impl Display for EchoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "echo failed: {}", self.0)
    }
}

impl Error for EchoError {}

impl ModelProviderError for EchoError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

struct EchoResponse {
    words: VecDeque<String>,
    finished: bool,
}

impl ModelResponse for EchoResponse {
    type Error = EchoError;

    fn poll_event(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if let Some(word) = this.words.pop_front() {
            return Poll::Ready(Ok(Some(ModelResponseEvent::TextDelta(word))));
        }
        if !this.finished {
            this.finished = true;
            return Poll::Ready(Ok(Some(ModelResponseEvent::Finished(
                FinishReason::Stop,
            ))));
        }
        Poll::Ready(Ok(None))
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = EchoError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.clone()),
            _ => None,
        });
        let result = match last_user {
            Some(text) => Ok(EchoResponse {
                words: format!("You asked: {text}")
                    .split_inclusive(' ')
                    .map(str::to_owned)
                    .collect(),
                finished: false,
            }),
            None => Err(EchoError(ErrorKind::Protocol)),
        };
        ready(result)
    }
}

#[tokio::test]
async fn test_drain_response() {
    let req = ModelRequest {
        messages: vec![
            ModelMessage::System("Answer questions about the shop.".to_owned()),
            ModelMessage::User("How many orders?".to_owned()),
        ],
        tools: vec![],
    };
    let mut resp = EchoProvider.send_request(&req).await.unwrap();

    let mut text = String::new();
    let mut finish = None;
    while let Some(event) = poll_fn(|cx| Pin::new(&mut resp).poll_event(cx))
        .await
        .unwrap()
    {
        match event {
            ModelResponseEvent::TextDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::Finished(reason) => finish = Some(reason),
            ModelResponseEvent::ToolCall(_) => unreachable!(),
        }
    }

    assert_eq!(text, "You asked: How many orders?");
    assert_eq!(finish, Some(FinishReason::Stop));
    assert!(resp.provider_message().is_none());
}

#[tokio::test]
async fn test_request_without_user_message() {
    let err = EchoProvider
        .send_request(&ModelRequest::default())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(err.to_string(), "echo failed: protocol error");
}
