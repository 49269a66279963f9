use serde_json::Value;

use crate::ProviderMessage;

/// Everything the model needs to produce the next assistant message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools the model may call.
    pub tools: Vec<ModelTool>,
}

/// One message of a [`ModelRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelMessage {
    /// System instructions.
    System(String),
    /// Text typed by the user.
    User(String),
    /// Plain assistant text.
    Assistant(String),
    /// Observation returned by a tool.
    Tool(ToolCallResult),
    /// An assistant message in the provider's own representation.
    Provider(ProviderMessage),
}

/// Output of a tool, addressed to the call that requested it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallResult {
    /// Id of the originating [`crate::ToolCallRequest`].
    pub id: String,
    /// Text handed back to the model.
    pub content: String,
}

/// A tool definition advertised to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelTool {
    /// Unique tool name.
    pub name: String,
    /// What the tool does and when to use it.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}
