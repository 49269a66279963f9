use thiserror::Error;

/// Failure to obtain a database connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The connection URI is empty or has no scheme.
    #[error("invalid database URI: {0}")]
    InvalidUri(String),
    /// The URI names a database this build cannot talk to.
    #[error("unsupported database scheme `{0}`")]
    UnsupportedScheme(String),
    /// The database could not be reached or refused the credentials.
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),
}

/// Failure of a statement or an introspection query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Some of the requested tables do not exist.
    #[error("table_names {} not found in database", .0.join(", "))]
    UnknownTables(Vec<String>),
    /// The database rejected the statement.
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}
