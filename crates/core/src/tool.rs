//! Tools the agent can call while answering a query.

mod error;
mod toolset;

use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub use toolset::Toolset;

/// Output of a tool call, either an observation for the model or an error.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Tools are shared by every invocation of an agent, so anything they need
/// at run time (a database handle, a model client) is captured when the
/// tool is created and cloned into the future returned by
/// [`Tool::execute`].
pub trait Tool: Send + Sync + 'static {
    /// Arguments accepted by the tool.
    type Input: DeserializeOwned;

    /// Returns the unique name of the tool.
    fn name(&self) -> &str;

    /// Describes the tool to the model.
    fn description(&self) -> &str;

    /// Returns the JSON schema of [`Tool::Input`].
    fn parameter_schema(&self) -> &Value;

    /// Runs the tool.
    ///
    /// The returned future must not borrow `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

pub(crate) type BoxedToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn execute(&self, arguments: Value) -> BoxedToolFuture;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    fn execute(&self, arguments: Value) -> BoxedToolFuture {
        match serde_json::from_value::<T::Input>(arguments) {
            Ok(input) => Box::pin(self.0.execute(input)),
            Err(err) => Box::pin(std::future::ready(Err(
                Error::invalid_input().with_reason(format!("invalid arguments: {err}")),
            ))),
        }
    }
}
