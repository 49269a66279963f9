use sqlx::AnyPool;
use sqlx::any::AnyRow;
use sqlx::{Column, Row};

use crate::dialect::Dialect;
use crate::error::QueryError;

/// Cell values longer than this many characters are cut off.
pub const MAX_CELL_CHARS: usize = 300;

/// Number of sample rows shown with each table schema.
pub const SAMPLE_ROWS: usize = 3;

const NULL: &str = "NULL";

/// A cheaply clonable handle to a connected database.
#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
}

impl Database {
    /// Wraps an open pool.
    #[inline]
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self { pool, dialect }
    }

    /// Returns the dialect of the database.
    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the underlying pool.
    #[inline]
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Checks that the database answers.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Lists the tables the agent may query, sorted by name.
    pub async fn usable_table_names(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(self.dialect.list_tables_sql())
            .fetch_all(&self.pool)
            .await
    }

    /// Describes `tables` as `CREATE TABLE` statements followed by a few
    /// sample rows each.
    pub async fn table_info(&self, tables: &[&str]) -> Result<String, QueryError> {
        let usable = self.usable_table_names().await?;
        let missing: Vec<String> = tables
            .iter()
            .filter(|table| !usable.iter().any(|name| name == *table))
            .map(|table| table.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(QueryError::UnknownTables(missing));
        }

        let mut sections = Vec::with_capacity(tables.len());
        for table in tables {
            sections.push(self.describe_table(table).await?);
        }
        Ok(sections.join("\n\n"))
    }

    async fn describe_table(&self, table: &str) -> Result<String, QueryError> {
        let columns: Vec<(String, String, String)> =
            sqlx::query_as(self.dialect.columns_sql())
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        let quoted = self.dialect.quote_identifier(table);
        let mut out = format!("CREATE TABLE {quoted} (\n");
        for (i, (name, ty, nullable)) in columns.iter().enumerate() {
            out.push_str(&format!(
                "\t{} {ty}",
                self.dialect.quote_identifier(name)
            ));
            if nullable.eq_ignore_ascii_case("NO") {
                out.push_str(" NOT NULL");
            }
            if i + 1 < columns.len() {
                out.push(',');
            }
            out.push('\n');
        }
        out.push(')');

        let sample_sql = format!("SELECT * FROM {quoted} LIMIT {SAMPLE_ROWS}");
        let rows = sqlx::query(&sample_sql).fetch_all(&self.pool).await?;
        out.push_str(&format!(
            "\n\n/*\n{SAMPLE_ROWS} rows from {table} table:\n"
        ));
        let header: Vec<&str> = columns.iter().map(|(name, _, _)| name.as_str()).collect();
        out.push_str(&header.join("\t"));
        for row in &rows {
            out.push('\n');
            out.push_str(&render_row(row, "\t"));
        }
        out.push_str("\n*/");
        Ok(out)
    }

    /// Runs a statement and renders the rows it returns as a text table.
    pub async fn run(&self, sql: &str) -> Result<String, QueryError> {
        debug!("running query: {sql}");
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|err| warn!("query failed: {err}"))?;
        trace!("query returned {} rows", rows.len());
        Ok(render_rows(&rows))
    }
}

fn render_rows(rows: &[AnyRow]) -> String {
    let Some(first) = rows.first() else {
        return "(no rows)".to_owned();
    };

    let mut out = first
        .columns()
        .iter()
        .map(|column| column.name())
        .collect::<Vec<_>>()
        .join(" | ");
    for row in rows {
        out.push('\n');
        out.push_str(&render_row(row, " | "));
    }
    out
}

fn render_row(row: &AnyRow, separator: &str) -> String {
    (0..row.len())
        .map(|index| truncate_cell(decode_cell(row, index)))
        .collect::<Vec<_>>()
        .join(separator)
}

fn decode_cell(row: &AnyRow, index: usize) -> String {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.unwrap_or_else(|| NULL.to_owned());
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return display_or_null(value);
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(index) {
        return display_or_null(value);
    }
    if let Ok(value) = row.try_get::<Option<i16>, _>(index) {
        return display_or_null(value);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return display_or_null(value);
    }
    if let Ok(value) = row.try_get::<Option<f32>, _>(index) {
        return display_or_null(value);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return display_or_null(value);
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return value.map_or_else(
            || NULL.to_owned(),
            |bytes| format!("<{} bytes>", bytes.len()),
        );
    }
    "<unsupported>".to_owned()
}

#[inline]
fn display_or_null<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NULL.to_owned(), |value| value.to_string())
}

fn truncate_cell(value: String) -> String {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => format!("{}...", &value[..end]),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::shop_database;

    #[tokio::test]
    async fn test_usable_table_names() {
        let (_dir, database) = shop_database().await;
        assert_eq!(database.dialect(), Dialect::Sqlite);
        assert_eq!(
            database.usable_table_names().await.unwrap(),
            ["customers", "orders"]
        );
    }

    #[tokio::test]
    async fn test_run() {
        let (_dir, database) = shop_database().await;

        let out = database
            .run("SELECT id, customer_id, total, note FROM orders ORDER BY id LIMIT 2")
            .await
            .unwrap();
        assert_eq!(
            out,
            "id | customer_id | total | note\n1 | 1 | 9.5 | NULL\n2 | 2 | 20.25 | gift"
        );

        let out = database
            .run("SELECT COUNT(*) AS n FROM orders")
            .await
            .unwrap();
        assert_eq!(out, "n\n4");

        let out = database
            .run("SELECT * FROM orders WHERE total > 1000")
            .await
            .unwrap();
        assert_eq!(out, "(no rows)");
    }

    #[tokio::test]
    async fn test_run_error() {
        let (_dir, database) = shop_database().await;
        let err = database.run("SELECT nope FROM orders").await.unwrap_err();
        assert!(matches!(err, QueryError::Sql(_)));
        assert!(err.to_string().contains("nope"), "{err}");
    }

    #[tokio::test]
    async fn test_long_cells_are_truncated() {
        let (_dir, database) = shop_database().await;
        let out = database
            .run("SELECT replace(hex(zeroblob(400)), '00', 'x') AS long_text")
            .await
            .unwrap();
        let cell = out.lines().nth(1).unwrap();
        assert_eq!(cell.chars().count(), MAX_CELL_CHARS + 3);
        assert!(cell.ends_with("x..."));
    }

    #[tokio::test]
    async fn test_table_info() {
        let (_dir, database) = shop_database().await;
        let info = database.table_info(&["customers"]).await.unwrap();
        assert_eq!(
            info,
            "CREATE TABLE \"customers\" (\n\
             \t\"id\" INTEGER NOT NULL,\n\
             \t\"name\" TEXT NOT NULL\n\
             )\n\n\
             /*\n\
             3 rows from customers table:\n\
             id\tname\n\
             1\tAda\n\
             2\tGrace\n\
             */"
        );
    }

    #[tokio::test]
    async fn test_table_info_unknown_table() {
        let (_dir, database) = shop_database().await;
        let err = database
            .table_info(&["orders", "invoices"])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "table_names invoices not found in database");
    }

    #[test]
    fn test_truncate_cell() {
        assert_eq!(truncate_cell("short".to_owned()), "short");
        let long = "é".repeat(MAX_CELL_CHARS + 1);
        let truncated = truncate_cell(long);
        assert_eq!(truncated.chars().count(), MAX_CELL_CHARS + 3);
    }
}
