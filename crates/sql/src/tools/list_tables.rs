use dbchat_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::database::Database;

/// `sql_db_list_tables` takes no arguments.
#[derive(Deserialize, JsonSchema)]
pub struct ListTablesInput {}

/// Lists the tables in the database.
pub struct ListTablesTool {
    database: Database,
    parameter_schema: Value,
}

impl ListTablesTool {
    /// Creates the tool.
    #[inline]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            parameter_schema: schema_for!(ListTablesInput).to_value(),
        }
    }
}

impl Tool for ListTablesTool {
    type Input = ListTablesInput;

    fn name(&self) -> &str {
        "sql_db_list_tables"
    }

    fn description(&self) -> &str {
        "Input is an empty object, output is a comma-separated list of tables in the database."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        _input: ListTablesInput,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let database = self.database.clone();
        async move {
            let names = database.usable_table_names().await.map_err(|err| {
                ToolError::execution_error().with_reason(err.to_string())
            })?;
            Ok(names.join(", "))
        }
    }
}
