//! Mock database clients for testing.
//!
//! `MockDatabaseClient` answers statements from canned responses and records
//! every statement it sees; `FailingDatabaseClient` fails every call.

use super::{returns_rows, DatabaseClient, QueryResult, Value};
use crate::error::{FarmError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A statement as received by the mock, with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

enum CannedResponse {
    Result(QueryResult),
    Error(String),
}

/// A mock database client that returns predefined results.
///
/// Responses are matched by SQL fragment in registration order. Unmatched
/// SELECTs return an empty result; unmatched writes report one affected row.
#[derive(Default)]
pub struct MockDatabaseClient {
    responses: Vec<(String, CannedResponse)>,
    executed: Mutex<Vec<ExecutedStatement>>,
    delay: Option<Duration>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `result` for statements containing `fragment`.
    pub fn respond_to(mut self, fragment: impl Into<String>, result: QueryResult) -> Self {
        self.responses
            .push((fragment.into(), CannedResponse::Result(result)));
        self
    }

    /// Fails statements containing `fragment` with a query error.
    pub fn fail_on(mut self, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .push((fragment.into(), CannedResponse::Error(message.into())));
        self
    }

    /// Sleeps before answering each statement.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns every statement executed so far, in arrival order.
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(ExecutedStatement {
                sql: sql.to_string(),
                params: params.to_vec(),
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let canned = self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()));

        match canned {
            Some((_, CannedResponse::Result(result))) => Ok(result.clone()),
            Some((_, CannedResponse::Error(message))) => Err(FarmError::query(message.clone())),
            None if returns_rows(sql) => Ok(QueryResult::new()),
            None => Ok(QueryResult::with_rows_affected(1, None)),
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose connection is always down.
#[derive(Debug, Default)]
pub struct FailingDatabaseClient;

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute(&self, _sql: &str, _params: &[Value]) -> Result<QueryResult> {
        Err(FarmError::connection("Lost connection to MySQL server during query"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
