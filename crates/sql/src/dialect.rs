use std::fmt::{self, Display};

use crate::error::ConnectionError;

/// The SQL flavor of a connected database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL.
    Postgres,
    /// MySQL or MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// Detects the dialect from the scheme of a connection URI.
    ///
    /// A SQLAlchemy-style driver suffix (`postgresql+psycopg2://`) is
    /// accepted and ignored.
    pub fn from_uri(uri: &str) -> Result<Self, ConnectionError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(ConnectionError::InvalidUri("the URI is empty".to_owned()));
        }
        let Some((scheme, _)) = uri.split_once(':') else {
            return Err(ConnectionError::InvalidUri(
                "the URI has no scheme".to_owned(),
            ));
        };
        let base = scheme.split('+').next().unwrap_or(scheme);
        match base.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(ConnectionError::UnsupportedScheme(scheme.to_owned())),
        }
    }

    /// Rewrites `uri` into the form sqlx expects: the driver suffix is
    /// dropped and the scheme is canonical for the dialect.
    pub(crate) fn normalize_uri(self, uri: &str) -> String {
        let uri = uri.trim();
        let rest = uri.split_once(':').map_or("", |(_, rest)| rest);
        let scheme = match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        };
        format!("{scheme}:{rest}")
    }

    /// Quotes an identifier for use in generated SQL.
    pub fn quote_identifier(self, ident: &str) -> String {
        let quote = match self {
            Dialect::MySql => '`',
            Dialect::Postgres | Dialect::Sqlite => '"',
        };
        let mut quoted = String::with_capacity(ident.len() + 2);
        quoted.push(quote);
        for c in ident.chars() {
            if c == quote {
                quoted.push(quote);
            }
            quoted.push(c);
        }
        quoted.push(quote);
        quoted
    }

    /// Lists the base tables visible to the connection, one text column.
    pub(crate) fn list_tables_sql(self) -> &'static str {
        match self {
            Dialect::Postgres => {
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
                 ORDER BY table_name"
            }
            Dialect::MySql => {
                "SELECT CAST(table_name AS CHAR) FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
                 ORDER BY table_name"
            }
            Dialect::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name"
            }
        }
    }

    /// Describes the columns of one table as `(name, type, is_nullable)`
    /// text triples, binding the table name as the only parameter.
    pub(crate) fn columns_sql(self) -> &'static str {
        match self {
            Dialect::Postgres => {
                "SELECT column_name::text, data_type::text, is_nullable::text \
                 FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = $1 \
                 ORDER BY ordinal_position"
            }
            Dialect::MySql => {
                "SELECT CAST(column_name AS CHAR), CAST(column_type AS CHAR), \
                 CAST(is_nullable AS CHAR) \
                 FROM information_schema.columns \
                 WHERE table_schema = DATABASE() AND table_name = ? \
                 ORDER BY ordinal_position"
            }
            Dialect::Sqlite => {
                "SELECT name, type, CASE WHEN \"notnull\" = 0 THEN 'YES' ELSE 'NO' END \
                 FROM pragma_table_info(?) ORDER BY cid"
            }
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "PostgreSQL"),
            Dialect::MySql => write!(f, "MySQL"),
            Dialect::Sqlite => write!(f, "SQLite"),
        }
    }
}
