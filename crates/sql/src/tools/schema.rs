use dbchat_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::database::Database;

/// Arguments of `sql_db_schema`.
#[derive(Deserialize, JsonSchema)]
pub struct SchemaInput {
    #[schemars(description = "Comma-separated table names, e.g. \"table1, table2\".")]
    tables: String,
}

/// Shows the schema and sample rows of some tables.
pub struct SchemaTool {
    database: Database,
    parameter_schema: Value,
}

impl SchemaTool {
    /// Creates the tool.
    #[inline]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            parameter_schema: schema_for!(SchemaInput).to_value(),
        }
    }
}

impl Tool for SchemaTool {
    type Input = SchemaInput;

    fn name(&self) -> &str {
        "sql_db_schema"
    }

    fn description(&self) -> &str {
        r#"
Input is a comma-separated list of tables, output is the schema and sample rows for those tables.
Be sure that the tables actually exist by calling sql_db_list_tables first!
Example input: "table1, table2, table3""#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SchemaInput,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let database = self.database.clone();
        async move {
            let tables: Vec<&str> = input
                .tables
                .split(',')
                .map(str::trim)
                .filter(|table| !table.is_empty())
                .collect();
            if tables.is_empty() {
                return Err(ToolError::invalid_input()
                    .with_reason("at least one table name is required"));
            }
            database.table_info(&tables).await.map_err(|err| {
                ToolError::execution_error().with_reason(err.to_string())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use dbchat_core::tool::ErrorKind;

    use super::*;
    use crate::fixtures::shop_database;

    #[tokio::test]
    async fn test_schema() {
        let (_dir, database) = shop_database().await;
        let tool = SchemaTool::new(database);

        let out = tool
            .execute(SchemaInput {
                tables: " orders ,customers,".to_owned(),
            })
            .await
            .unwrap();
        assert!(out.starts_with("CREATE TABLE \"orders\""), "{out}");
        assert!(out.contains("CREATE TABLE \"customers\""), "{out}");

        let err = tool
            .execute(SchemaInput {
                tables: " , ".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = tool
            .execute(SchemaInput {
                tables: "invoices".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert_eq!(err.reason(), "table_names invoices not found in database");
    }
}
