use dbchat_core::ModelClient;
use dbchat_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::dialect::Dialect;

const CHECK_PROMPT: &str = r#"{query}
Double check the {dialect} query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins

If there are any of the above mistakes, rewrite the query. If there are no mistakes, just reproduce the original query.

Output the final SQL query only."#;

/// Arguments of `sql_db_query_checker`.
#[derive(Deserialize, JsonSchema)]
pub struct QueryCheckerInput {
    #[schemars(description = "The SQL query to check.")]
    query: String,
}

/// Asks the model to review a query before it is run.
pub struct QueryCheckerTool {
    model_client: ModelClient,
    dialect: Dialect,
    parameter_schema: Value,
}

impl QueryCheckerTool {
    /// Creates the tool.
    #[inline]
    pub fn new(model_client: ModelClient, dialect: Dialect) -> Self {
        Self {
            model_client,
            dialect,
            parameter_schema: schema_for!(QueryCheckerInput).to_value(),
        }
    }
}

impl Tool for QueryCheckerTool {
    type Input = QueryCheckerInput;

    fn name(&self) -> &str {
        "sql_db_query_checker"
    }

    fn description(&self) -> &str {
        r#"
Use this tool to double check if your query is correct before executing it.
Always use this tool before executing a query with sql_db_query!"#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: QueryCheckerInput,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let model_client = self.model_client.clone();
        let prompt = CHECK_PROMPT
            .replace("{dialect}", &self.dialect.to_string())
            .replace("{query}", &input.query);
        async move {
            let answer = model_client.complete(None, &prompt).await.map_err(|err| {
                ToolError::execution_error().with_reason(err.to_string())
            })?;
            Ok(strip_code_fence(&answer).to_owned())
        }
    }
}

/// Unwraps a reply of the form ```` ```sql ... ``` ````.
fn strip_code_fence(answer: &str) -> &str {
    let answer = answer.trim();
    let Some(inner) = answer.strip_prefix("```") else {
        return answer;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    let inner = inner
        .strip_prefix("sql")
        .or_else(|| inner.strip_prefix("SQL"))
        .unwrap_or(inner);
    inner.trim()
}
