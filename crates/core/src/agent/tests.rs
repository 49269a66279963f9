use std::future::ready;
use std::sync::{Arc, LazyLock, Mutex};

use dbchat_model::{ErrorKind, ModelMessage, ModelResponseEvent, ToolCallRequest};
use dbchat_test_model::ScriptedProvider;
use serde::Deserialize;
use serde_json::{Value, json};

use super::*;
use crate::tool::{Error as ToolError, Tool, ToolResult};

static COUNT_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": { "table": { "type": "string" } },
        "required": ["table"]
    })
});

#[derive(Deserialize)]
struct CountInput {
    table: String,
}

struct CountRowsTool;

impl Tool for CountRowsTool {
    type Input = CountInput;

    fn name(&self) -> &str {
        "count_rows"
    }

    fn description(&self) -> &str {
        "Counts the rows of a table."
    }

    fn parameter_schema(&self) -> &Value {
        &COUNT_SCHEMA
    }

    fn execute(
        &self,
        input: CountInput,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(match input.table.as_str() {
            "orders" => Ok("42".to_owned()),
            other => Err(ToolError::execution_error()
                .with_reason(format!("no such table: {other}"))),
        })
    }
}

fn call(id: &str, table: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_owned(),
        name: "count_rows".to_owned(),
        arguments: json!({ "table": table }),
    }
}

fn recorder() -> (Arc<Mutex<Vec<ProgressEvent>>>, Arc<dyn ProgressSink>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let events = Arc::clone(&events);
        move |event: ProgressEvent| events.lock().unwrap().push(event)
    };
    (events, Arc::new(sink))
}

#[tokio::test]
async fn test_direct_answer() {
    let provider = ScriptedProvider::default();
    provider.push_text("Hello! Ask me about the database.");
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_system_prompt("You answer questions about a shop database.")
        .with_tool(CountRowsTool)
        .build();

    let resp = agent.invoke("hi", None).await.unwrap();
    assert_eq!(resp.output, "Hello! Ask me about the database.");
    assert!(resp.steps.is_empty());

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].messages,
        vec![
            ModelMessage::System(
                "You answer questions about a shop database.".to_owned()
            ),
            ModelMessage::User("hi".to_owned()),
        ]
    );
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tools[0].name, "count_rows");
}

#[tokio::test]
async fn test_tool_loop_with_progress() {
    let provider = ScriptedProvider::default();
    provider.push_reply([
        ModelResponseEvent::TextDelta("Counting.".to_owned()),
        ModelResponseEvent::ToolCall(call("call_1", "orders")),
    ]);
    provider.push_text("There are 42 orders.");
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(CountRowsTool)
        .build();

    let (events, sink) = recorder();
    let resp = agent
        .invoke("How many orders last month?", Some(sink))
        .await
        .unwrap();

    assert_eq!(resp.output, "There are 42 orders.");
    assert_eq!(
        resp.steps,
        vec![AgentStep {
            tool: "count_rows".to_owned(),
            input: json!({ "table": "orders" }),
            observation: "42".to_owned(),
        }]
    );
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            ProgressEvent::Thinking {
                text: "Counting.".to_owned()
            },
            ProgressEvent::ToolStarted {
                tool: "count_rows".to_owned(),
                input: json!({ "table": "orders" }),
            },
            ProgressEvent::ToolFinished {
                tool: "count_rows".to_owned(),
                observation: "42".to_owned(),
            },
            ProgressEvent::Thinking {
                text: "There are 42 orders.".to_owned()
            },
        ]
    );

    // The second request replays the assistant turn and the observation.
    let second = &provider.requests()[1];
    assert_eq!(second.messages.len(), 3);
    assert!(matches!(second.messages[1], ModelMessage::Provider(_)));
    assert_eq!(
        second.messages[2],
        ModelMessage::Tool(ToolCallResult {
            id: "call_1".to_owned(),
            content: "42".to_owned(),
        })
    );
}

#[tokio::test]
async fn test_tool_errors_are_fed_back() {
    let provider = ScriptedProvider::default();
    provider.push_tool_call("call_1", "count_rows", json!({ "table": "order" }));
    provider.push_tool_call("call_2", "drop_everything", json!({}));
    provider.push_text("I could not find that table.");
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(CountRowsTool)
        .build();

    let resp = agent.invoke("count orders", None).await.unwrap();
    assert_eq!(resp.output, "I could not find that table.");
    assert_eq!(resp.steps[0].observation, "Error: no such table: order");
    assert_eq!(
        resp.steps[1].observation,
        "Error: drop_everything is not a valid tool, try one of [count_rows]."
    );
}

#[tokio::test]
async fn test_model_failure() {
    let provider = ScriptedProvider::default();
    provider.push_failure(ErrorKind::Timeout, "upstream timed out");
    let agent = AgentBuilder::with_model_provider(provider).build();

    let err = agent.invoke("anything", None).await.unwrap_err();
    assert_eq!(err.model_error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(err.to_string(), "upstream timed out");
}

#[tokio::test]
async fn test_iteration_limit() {
    let provider = ScriptedProvider::default();
    for i in 0..3 {
        provider.push_reply([ModelResponseEvent::ToolCall(call(
            &format!("call_{i}"),
            "orders",
        ))]);
    }
    let agent = AgentBuilder::with_model_provider(provider.clone())
        .with_tool(CountRowsTool)
        .with_max_iterations(2)
        .build();

    let err = agent.invoke("loop forever", None).await.unwrap_err();
    assert!(matches!(err, AgentError::IterationLimit(2)));
    assert_eq!(provider.remaining(), 1);
}
