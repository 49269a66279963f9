use std::sync::Arc;

use dbchat_model::ModelProvider;

use super::{Agent, AgentInner};
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Tool, ToolObject, Toolset};

/// How many model requests one query may take by default.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    system_prompt: Option<String>,
    tools: Vec<Box<dyn ToolObject>>,
    max_iterations: usize,
}

impl AgentBuilder {
    /// Creates a builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(provider: P) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a builder sharing an existing model client.
    #[inline]
    pub fn with_model_client(model_client: ModelClient) -> Self {
        Self {
            model_client,
            system_prompt: None,
            tools: vec![],
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the system prompt sent at the start of every invocation.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(AnyTool(tool)));
        self
    }

    /// Caps the number of model requests per query. Zero is treated as one.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Returns the model client the agent will use.
    #[inline]
    pub fn model_client(&self) -> &ModelClient {
        &self.model_client
    }

    /// Builds the agent.
    pub fn build(self) -> Agent {
        let toolset = Toolset::new(self.tools);
        debug!("agent built with tools {:?}", toolset.names());
        Agent {
            inner: Arc::new(AgentInner {
                model_client: self.model_client,
                system_prompt: self.system_prompt,
                toolset,
                max_iterations: self.max_iterations,
            }),
        }
    }
}
