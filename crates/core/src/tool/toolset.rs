use std::collections::BTreeMap;

use dbchat_model::{ModelTool, ToolCallRequest};

use super::{BoxedToolFuture, Error, ToolObject};

/// The tools registered on an agent, keyed by name.
pub struct Toolset {
    tools: BTreeMap<String, Box<dyn ToolObject>>,
}

impl Toolset {
    pub(crate) fn new(tools: Vec<Box<dyn ToolObject>>) -> Self {
        let mut map = BTreeMap::new();
        for tool in tools {
            let name = tool.name().to_owned();
            if map.insert(name.clone(), tool).is_some() {
                warn!("tool {name} registered twice, keeping the last one");
            }
        }
        Self { tools: map }
    }

    /// Returns the definitions advertised to the model, ordered by name.
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .values()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Returns the registered tool names, ordered.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Starts the tool call described by `req`.
    pub fn execute(&self, req: &ToolCallRequest) -> BoxedToolFuture {
        let Some(tool) = self.tools.get(&req.name) else {
            warn!("model requested unknown tool: {}", req.name);
            let reason = format!(
                "{} is not a valid tool, try one of [{}].",
                req.name,
                self.names().join(", ")
            );
            return Box::pin(std::future::ready(Err(
                Error::unknown_tool().with_reason(reason),
            )));
        };
        trace!("running tool {} ({}) with {}", req.name, req.id, req.arguments);
        tool.execute(req.arguments.clone())
    }
}
