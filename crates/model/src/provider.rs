use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// Errors produced by a [`ModelProvider`] or its responses.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Classifies this error.
    fn kind(&self) -> ErrorKind;
}

/// Entry point for sampling a chat model.
///
/// A provider is treated as stateless by its callers: the same value may
/// be shared by many agents and many concurrent requests.
pub trait ModelProvider: Send + Sync {
    /// Error type of the provider.
    type Error: ModelProviderError;

    /// Streamed response type of the provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Starts a request.
    ///
    /// The returned future must not borrow `self` or `req`, everything it
    /// needs is captured up front.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
