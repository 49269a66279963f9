//! A small on-disk SQLite shop used by tests.

use tempfile::TempDir;

use crate::connection::{Connector, SqlConnector};
use crate::database::Database;

const SCHEMA: &[&str] = &[
    "CREATE TABLE customers (id INTEGER PRIMARY KEY NOT NULL, name TEXT NOT NULL)",
    "CREATE TABLE orders (\
        id INTEGER PRIMARY KEY NOT NULL, \
        customer_id INTEGER NOT NULL REFERENCES customers(id), \
        total REAL NOT NULL, \
        note TEXT)",
    "INSERT INTO customers (id, name) VALUES (1, 'Ada'), (2, 'Grace')",
    "INSERT INTO orders (id, customer_id, total, note) VALUES \
        (1, 1, 9.5, NULL), (2, 2, 20.25, 'gift'), (3, 1, 3.0, NULL), (4, 2, 7.75, NULL)",
];

/// Creates the shop database. Keep the directory alive while the database
/// is in use.
pub(crate) async fn shop_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("sqlite://{}?mode=rwc", dir.path().join("shop.db").display());
    let database = SqlConnector::new().connect(&uri).await.unwrap();
    for statement in SCHEMA {
        database.run(statement).await.unwrap();
    }
    (dir, database)
}
