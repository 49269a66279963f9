//! The tools the agent uses to explore and query the database.

mod list_tables;
mod query;
mod query_checker;
mod schema;

use dbchat_core::{AgentBuilder, ModelClient};

use crate::database::Database;

pub use list_tables::{ListTablesInput, ListTablesTool};
pub use query::{QueryInput, QueryTool};
pub use query_checker::{QueryCheckerInput, QueryCheckerTool};
pub use schema::{SchemaInput, SchemaTool};

/// The standard set of SQL tools bound to one database.
pub struct SqlToolkit {
    database: Database,
    checker: Option<ModelClient>,
}

impl SqlToolkit {
    /// Creates a toolkit for `database`.
    #[inline]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            checker: None,
        }
    }

    /// Uses `model_client` for the query checker instead of the agent's own
    /// model.
    #[inline]
    pub fn with_checker(mut self, model_client: ModelClient) -> Self {
        self.checker = Some(model_client);
        self
    }

    /// Registers every tool on `builder`.
    pub fn register(self, builder: AgentBuilder) -> AgentBuilder {
        let checker = self
            .checker
            .unwrap_or_else(|| builder.model_client().clone());
        let dialect = self.database.dialect();
        builder
            .with_tool(ListTablesTool::new(self.database.clone()))
            .with_tool(SchemaTool::new(self.database.clone()))
            .with_tool(QueryTool::new(self.database))
            .with_tool(QueryCheckerTool::new(checker, dialect))
    }
}
