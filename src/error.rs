//! Error types for farm-records.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for farm-records operations.
#[derive(Error, Debug)]
pub enum FarmError {
    /// The caller asked for a route that is not registered.
    #[error("Unknown route: '{0}'")]
    UnknownRoute(String),

    /// Page size was zero or negative.
    #[error("Invalid page size: {0} (must be positive)")]
    InvalidPageSize(i64),

    /// Page number was below 1.
    #[error("Invalid page number: {0} (pages start at 1)")]
    InvalidPageNumber(i64),

    /// A paged read failed; wraps the failure reported by the database layer.
    #[error("Query execution failed: {0}")]
    QueryExecution(#[source] Box<FarmError>),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// SQL the server could not parse.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Unique, foreign key, not-null and check violations.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Any other query execution error.
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sign-in, sign-up and missing-session errors.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Caller-supplied data that cannot be turned into a statement.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller cancelled the operation before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FarmError {
    /// Creates an unknown route error for the given name.
    pub fn unknown_route(name: impl Into<String>) -> Self {
        Self::UnknownRoute(name.into())
    }

    /// Wraps a database layer error as a paged query failure.
    pub fn query_execution(cause: FarmError) -> Self {
        Self::QueryExecution(Box::new(cause))
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a syntax error with the given message.
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    /// Creates a constraint violation error with the given message.
    pub fn constraint_violation(msg: impl Into<String>) -> Self {
        Self::ConstraintViolation(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an authentication error with the given message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Creates an invalid input error with the given message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownRoute(_) => "Unknown Route",
            Self::InvalidPageSize(_) => "Invalid Page Size",
            Self::InvalidPageNumber(_) => "Invalid Page Number",
            Self::QueryExecution(_) => "Query Execution Error",
            Self::Connection(_) => "Connection Error",
            Self::Syntax(_) => "Syntax Error",
            Self::ConstraintViolation(_) => "Constraint Violation",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Auth(_) => "Authentication Error",
            Self::InvalidInput(_) => "Invalid Input",
            Self::Cancelled => "Cancelled",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true for errors that indicate a programming or deployment mistake
    /// rather than a runtime failure the user can act on.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownRoute(_) | Self::InvalidPageSize(_) | Self::Internal(_)
        )
    }
}

/// Result type alias using FarmError.
pub type Result<T> = std::result::Result<T, FarmError>;
