//! Shared test doubles.

use std::sync::Mutex;

use dbchat_core::{
    AgentError, AgentResponse, DEFAULT_MAX_ITERATIONS, QueryAgent,
};
use dbchat_sql::{Connector, Database, SqlConnector};
use tempfile::TempDir;

/// An agent that always gives the same answer, or always fails.
pub(crate) struct StubAgent {
    reply: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl StubAgent {
    pub(crate) fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_owned()),
            queries: Mutex::default(),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            queries: Mutex::default(),
        }
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl QueryAgent for StubAgent {
    fn invoke(
        &self,
        query: &str,
        _progress: Option<std::sync::Arc<dyn dbchat_core::ProgressSink>>,
    ) -> impl Future<Output = Result<AgentResponse, AgentError>> + Send {
        self.queries.lock().unwrap().push(query.to_owned());
        let result = match &self.reply {
            Some(reply) => Ok(AgentResponse {
                output: reply.clone(),
                steps: vec![],
            }),
            None => Err(AgentError::IterationLimit(DEFAULT_MAX_ITERATIONS)),
        };
        std::future::ready(result)
    }
}

pub(crate) fn shop_uri(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("shop.db").display())
}

/// Creates a small SQLite shop with an `orders` table of four rows.
pub(crate) async fn shop_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let database = SqlConnector::new().connect(&shop_uri(&dir)).await.unwrap();
    for statement in [
        "CREATE TABLE orders (\
            id INTEGER PRIMARY KEY NOT NULL, \
            total REAL NOT NULL\
        )",
        "INSERT INTO orders (id, total) \
            VALUES (1, 9.5), (2, 20.25), (3, 3.0), (4, 7.75)",
    ] {
        database.run(statement).await.unwrap();
    }
    (dir, database)
}
