use serde::Serialize;
use serde_json::Value;

/// Intermediate activity of an agent run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A chunk of model text, streamed as it is generated.
    Thinking {
        /// The text chunk.
        text: String,
    },
    /// A tool is about to run.
    ToolStarted {
        /// Tool name.
        tool: String,
        /// Arguments passed by the model.
        input: Value,
    },
    /// A tool returned.
    ToolFinished {
        /// Tool name.
        tool: String,
        /// Observation handed back to the model.
        observation: String,
    },
}

/// Receives [`ProgressEvent`]s during [`crate::Agent::invoke`].
///
/// Called zero or more times, always before `invoke` returns. Callers must
/// not depend on being called at all.
pub trait ProgressSink: Send + Sync {
    /// Handles one event.
    fn on_progress(&self, event: ProgressEvent);
}

impl<F: Fn(ProgressEvent) + Send + Sync> ProgressSink for F {
    #[inline]
    fn on_progress(&self, event: ProgressEvent) {
        self(event)
    }
}
