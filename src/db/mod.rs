//! Database abstraction layer for farm-records.
//!
//! Provides a trait-based interface for statement execution, allowing
//! different database backends to be used interchangeably.

mod mock;
mod mysql;
mod sqlite;
mod types;

pub use mock::{ExecutedStatement, FailingDatabaseClient, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::DatabaseConfig;
use crate::error::{FarmError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Mysql,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::Mysql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Creates a database client for the configured backend.
///
/// This is the central factory function for database connections.
pub async fn connect(
    config: &DatabaseConfig,
    query_timeout: Duration,
) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Mysql => {
            let client = MySqlClient::connect(config, query_timeout).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config, query_timeout).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the query execution service.
///
/// Every caller-supplied value travels in `params` and is bound by the driver;
/// implementations never splice parameters into the statement text.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a statement with positional `?` parameters.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Returns true when the statement produces a result set.
pub(crate) fn returns_rows(sql: &str) -> bool {
    let head = sql.trim_start().to_uppercase();
    head.starts_with("SELECT") || head.starts_with("WITH") || head.starts_with("SHOW")
}

/// Error for a statement that outlived the configured query timeout.
pub(crate) fn timeout_error(timeout: Duration) -> FarmError {
    FarmError::query(format!(
        "Query timed out after {} seconds",
        timeout.as_secs()
    ))
}

/// Maps a sqlx execution error onto the error taxonomy.
pub(crate) fn map_query_error(error: sqlx::Error) -> FarmError {
    match &error {
        sqlx::Error::Database(db_error) => {
            let message = db_error.message().to_string();
            match db_error.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    FarmError::constraint_violation(message)
                }
                _ => {
                    let code = db_error.code().map(|c| c.to_string()).unwrap_or_default();
                    if code == "42000" || message.to_lowercase().contains("syntax error") {
                        FarmError::syntax(message)
                    } else {
                        FarmError::query(message)
                    }
                }
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => FarmError::connection(error.to_string()),
        _ => FarmError::query(error.to_string()),
    }
}
