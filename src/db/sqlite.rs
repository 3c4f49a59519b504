//! SQLite database client implementation.
//!
//! Backs local single-user installs and the in-memory fixture store used by tests.
//! The registry's `LIMIT ?, ?` templates are valid SQLite, so both backends
//! share the same SQL.

use crate::config::DatabaseConfig;
use crate::db::{
    map_query_error, returns_rows, timeout_error, ColumnInfo, DatabaseClient, QueryResult, Row,
    Value,
};
use crate::error::{FarmError, Result};
use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Sqlite, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteClient {
    /// Opens (creating if missing) the configured SQLite database.
    pub async fn connect(config: &DatabaseConfig, query_timeout: Duration) -> Result<Self> {
        config.validate()?;
        let path = config.path.as_deref().unwrap_or(":memory:");

        let base = if path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| FarmError::config(format!("Invalid database path: {e}")))?
        } else {
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        };
        let options = base
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // A single connection keeps one session; for `:memory:` it is also the
        // only way every statement sees the same database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| FarmError::connection(format!("Failed to open {path}: {e}")))?;

        info!("SQLite database opened at {path}");
        Ok(Self {
            pool,
            query_timeout,
        })
    }

    /// Opens a fresh in-memory database.
    pub async fn open_in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::sqlite_in_memory(), Duration::from_secs(30)).await
    }

    /// Runs a multi-statement script without parameters (schema setup, seeding).
    pub async fn execute_script(&self, script: &str) -> Result<()> {
        sqlx::raw_sql(script)
            .execute(&self.pool)
            .await
            .map_err(map_query_error)?;
        Ok(())
    }

    async fn fetch_column_metadata(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).describe(sql).await {
            Ok(described) => described
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                debug!("Could not describe statement: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start = Instant::now();
        let query = bind_all(sqlx::query(sql), params);

        if !returns_rows(sql) {
            let done = tokio::time::timeout(self.query_timeout, query.execute(&self.pool))
                .await
                .map_err(|_| timeout_error(self.query_timeout))?
                .map_err(map_query_error)?;

            let last_insert_id = Some(done.last_insert_rowid()).filter(|id| *id > 0);
            return Ok(QueryResult::with_rows_affected(done.rows_affected(), last_insert_id)
                .with_execution_time(start.elapsed()));
        }

        let fetched = tokio::time::timeout(self.query_timeout, query.fetch_all(&self.pool))
            .await
            .map_err(|_| timeout_error(self.query_timeout))?
            .map_err(map_query_error)?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = if let Some(first_row) = fetched.first() {
            first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect()
        } else {
            self.fetch_column_metadata(sql).await
        };

        let rows: Vec<Row> = fetched.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Binds every parameter in order. SQLite has no native date type, so dates are
/// bound in their ISO text form.
fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::String(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
            Value::Date(d) => query.bind(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => query.bind(dt.to_rfc3339()),
        };
    }
    query
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// True when the value's storage class is INTEGER, whatever the declared type.
/// SQLite renders integers as text on request, so this has to be checked first.
fn stored_as_integer(row: &SqliteRow, index: usize) -> bool {
    row.try_get_raw(index)
        .map(|raw| !raw.is_null() && raw.type_info().name() == "INTEGER")
        .unwrap_or(false)
}

/// Converts a single column value from a SqliteRow to our Value type.
fn convert_value(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INTEGER" | "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "NUMERIC" => row
            .try_get_unchecked::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // Dates are stored as text or Unix milliseconds; normalization parses both.
        // Text dates fall through to the string arm below.
        "DATE" | "DATETIME" | "TIME" if stored_as_integer(row, index) => row
            .try_get_unchecked::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        _ => row
            .try_get_unchecked::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
