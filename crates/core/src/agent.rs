mod builder;
mod error;
mod progress;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use dbchat_model::{ModelMessage, ModelRequest, ToolCallResult};
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;

use crate::model_client::ModelClient;
use crate::tool::Toolset;
pub use builder::{AgentBuilder, DEFAULT_MAX_ITERATIONS};
pub use error::AgentError;
pub use progress::{ProgressEvent, ProgressSink};

/// A tool call made while answering a query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentStep {
    /// Name of the tool.
    pub tool: String,
    /// Arguments the model passed.
    pub input: Value,
    /// What the tool returned (or the error text fed back to the model).
    pub observation: String,
}

/// The result of [`Agent::invoke`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentResponse {
    /// The final answer text.
    pub output: String,
    /// Tool calls made on the way, in order.
    pub steps: Vec<AgentStep>,
}

/// Something that answers natural-language queries.
///
/// [`Agent`] is the real implementation; the seam lets the chat layer be
/// exercised against canned answers.
pub trait QueryAgent: Send + Sync + 'static {
    /// Answers `query`, optionally reporting progress to `progress`.
    fn invoke(
        &self,
        query: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> impl Future<Output = Result<AgentResponse, AgentError>> + Send;
}

/// A tool-using agent bound to a system prompt and a fixed toolset.
///
/// The agent holds no conversation memory: every [`Agent::invoke`] starts
/// from the system prompt and the query alone. Clones share everything.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    model_client: ModelClient,
    system_prompt: Option<String>,
    toolset: Toolset,
    max_iterations: usize,
}

impl Agent {
    /// Returns the system prompt the agent was built with.
    #[inline]
    pub fn system_prompt(&self) -> Option<&str> {
        self.inner.system_prompt.as_deref()
    }

    /// Returns the tools available to the agent.
    #[inline]
    pub fn toolset(&self) -> &Toolset {
        &self.inner.toolset
    }

    /// Answers `query`, calling tools as often as the model asks for them
    /// (up to the iteration budget).
    ///
    /// Tool failures do not abort the run: they are reported to the model
    /// as `Error: <reason>` observations so it can correct itself. Model
    /// failures and an exhausted budget are returned as errors.
    pub async fn invoke(
        &self,
        query: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<AgentResponse, AgentError> {
        self.run(query, progress)
            .instrument(debug_span!("agent invoke"))
            .await
    }

    async fn run(
        &self,
        query: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<AgentResponse, AgentError> {
        let inner = &*self.inner;
        let report = |event: ProgressEvent| {
            if let Some(progress) = &progress {
                progress.on_progress(event);
            }
        };

        let mut messages = Vec::with_capacity(4);
        if let Some(prompt) = &inner.system_prompt {
            messages.push(ModelMessage::System(prompt.clone()));
        }
        messages.push(ModelMessage::User(query.to_owned()));
        let tools = inner.toolset.definitions();
        let mut steps = Vec::new();

        for iteration in 1..=inner.max_iterations {
            let req = ModelRequest {
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let on_delta = {
                let progress = progress.clone();
                move |delta: &str| {
                    if let Some(progress) = &progress {
                        progress.on_progress(ProgressEvent::Thinking {
                            text: delta.to_owned(),
                        });
                    }
                }
            };
            let resp = inner
                .model_client
                .send_request(req, on_delta)
                .await
                .map_err(AgentError::Model)?;

            messages.push(match resp.provider_message {
                Some(msg) => ModelMessage::Provider(msg),
                None => ModelMessage::Assistant(resp.text.clone()),
            });

            if resp.tool_calls.is_empty() {
                debug!("answered after {iteration} model request(s)");
                return Ok(AgentResponse {
                    output: resp.text,
                    steps,
                });
            }

            for call in resp.tool_calls {
                report(ProgressEvent::ToolStarted {
                    tool: call.name.clone(),
                    input: call.arguments.clone(),
                });
                let observation = match inner.toolset.execute(&call).await {
                    Ok(output) => output,
                    Err(err) => {
                        debug!("tool {} failed: {err}", call.name);
                        format!("Error: {}", err.reason())
                    }
                };
                report(ProgressEvent::ToolFinished {
                    tool: call.name.clone(),
                    observation: observation.clone(),
                });

                messages.push(ModelMessage::Tool(ToolCallResult {
                    id: call.id,
                    content: observation.clone(),
                }));
                steps.push(AgentStep {
                    tool: call.name,
                    input: call.arguments,
                    observation,
                });
            }
        }

        warn!("no final answer after {} iterations", inner.max_iterations);
        Err(AgentError::IterationLimit(inner.max_iterations))
    }
}

impl QueryAgent for Agent {
    #[inline]
    fn invoke(
        &self,
        query: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> impl Future<Output = Result<AgentResponse, AgentError>> + Send {
        Agent::invoke(self, query, progress)
    }
}
