use dbchat_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::database::Database;

/// Arguments of `sql_db_query`.
#[derive(Deserialize, JsonSchema)]
pub struct QueryInput {
    #[schemars(description = "A detailed and correct SQL query.")]
    query: String,
}

/// Runs a SQL query and returns the rows.
pub struct QueryTool {
    database: Database,
    parameter_schema: Value,
}

impl QueryTool {
    /// Creates the tool.
    #[inline]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            parameter_schema: schema_for!(QueryInput).to_value(),
        }
    }
}

impl Tool for QueryTool {
    type Input = QueryInput;

    fn name(&self) -> &str {
        "sql_db_query"
    }

    fn description(&self) -> &str {
        r#"
Input is a detailed and correct SQL query, output is a result from the database.
If the query is not correct, an error message will be returned.
If an error is returned, rewrite the query, check the query, and try again.
If you encounter an unknown column error, use sql_db_schema to query the correct table fields."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: QueryInput,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let database = self.database.clone();
        async move {
            database.run(&input.query).await.map_err(|err| {
                ToolError::execution_error().with_reason(err.to_string())
            })
        }
    }
}
