//! Record writes: insert, update and delete.
//!
//! Table and column names cannot be bound as parameters, so tables come from a
//! closed enum and column names must be plain identifiers. Every value is bound.

use crate::db::{DatabaseClient, QueryResult, Value};
use crate::error::{FarmError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Writable tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Livestock,
    Vaccinations,
    Vetvisit,
    PastureMaintenance,
    Medication,
    Calves,
    Pastures,
}

impl Table {
    /// Every writable table.
    pub const ALL: [Table; 8] = [
        Table::Users,
        Table::Livestock,
        Table::Vaccinations,
        Table::Vetvisit,
        Table::PastureMaintenance,
        Table::Medication,
        Table::Calves,
        Table::Pastures,
    ];

    /// The table's SQL name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Livestock => "livestock",
            Self::Vaccinations => "vaccinations",
            Self::Vetvisit => "vetvisit",
            Self::PastureMaintenance => "pasture_maintenance",
            Self::Medication => "medication",
            Self::Calves => "calves",
            Self::Pastures => "pastures",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = FarmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|table| table.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FarmError::invalid_input(format!("Unknown table '{s}'")))
    }
}

/// Column name to value, in caller order.
pub type Fields = Vec<(String, Value)>;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// Validates and backtick-quotes a column name.
pub fn quote_identifier(name: &str) -> Result<String> {
    if identifier_pattern().is_match(name) {
        Ok(format!("`{name}`"))
    } else {
        Err(FarmError::invalid_input(format!(
            "'{name}' is not a valid column name"
        )))
    }
}

fn require_fields(fields: &Fields, what: &str) -> Result<()> {
    if fields.is_empty() {
        return Err(FarmError::invalid_input(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Builds `` `a` = ? AND `b` = ? `` (or comma-joined for SET lists).
fn assignments(fields: &Fields, separator: &str) -> Result<String> {
    let parts = fields
        .iter()
        .map(|(column, _)| quote_identifier(column).map(|quoted| format!("{quoted} = ?")))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(separator))
}

/// Builds an INSERT statement for `entity`.
pub fn insert_statement(table: Table, entity: &Fields) -> Result<String> {
    require_fields(entity, "entity")?;
    let columns = entity
        .iter()
        .map(|(column, _)| quote_identifier(column))
        .collect::<Result<Vec<_>>>()?;
    let placeholders = vec!["?"; entity.len()].join(", ");
    Ok(format!(
        "INSERT INTO `{}` ({}) VALUES ({placeholders})",
        table.as_str(),
        columns.join(", ")
    ))
}

/// Builds an UPDATE statement setting `changes` on rows matching `identifying`.
pub fn update_statement(table: Table, identifying: &Fields, changes: &Fields) -> Result<String> {
    require_fields(changes, "data to update")?;
    require_fields(identifying, "identifying data")?;
    Ok(format!(
        "UPDATE `{}` SET {} WHERE {}",
        table.as_str(),
        assignments(changes, ", ")?,
        assignments(identifying, " AND ")?
    ))
}

/// Builds a DELETE statement for rows matching `identifying`.
pub fn delete_statement(table: Table, identifying: &Fields) -> Result<String> {
    require_fields(identifying, "identifying data")?;
    Ok(format!(
        "DELETE FROM `{}` WHERE {}",
        table.as_str(),
        assignments(identifying, " AND ")?
    ))
}

fn values(fields: &Fields) -> impl Iterator<Item = Value> + '_ {
    fields.iter().map(|(_, value)| value.clone())
}

/// Inserts one row.
pub async fn insert_entity(
    db: &dyn DatabaseClient,
    table: Table,
    entity: &Fields,
) -> Result<QueryResult> {
    info!("Inserting into {table}");
    let sql = insert_statement(table, entity)?;
    debug!("{sql}");
    let params: Vec<Value> = values(entity).collect();
    db.execute(&sql, &params).await
}

/// Updates rows matching every identifying column.
pub async fn update_entity(
    db: &dyn DatabaseClient,
    table: Table,
    identifying: &Fields,
    changes: &Fields,
) -> Result<QueryResult> {
    info!("Updating {table}");
    let sql = update_statement(table, identifying, changes)?;
    debug!("{sql}");
    let params: Vec<Value> = values(changes).chain(values(identifying)).collect();
    db.execute(&sql, &params).await
}

/// Deletes rows matching every identifying column.
pub async fn delete_entity(
    db: &dyn DatabaseClient,
    table: Table,
    identifying: &Fields,
) -> Result<QueryResult> {
    info!("Deleting from {table}");
    let sql = delete_statement(table, identifying)?;
    debug!("{sql}");
    let params: Vec<Value> = values(identifying).collect();
    db.execute(&sql, &params).await
}

/// Fetches the user row for `email`.
pub async fn user_by_email(db: &dyn DatabaseClient, email: &str) -> Result<QueryResult> {
    debug!("Looking up user by email");
    db.execute(
        "SELECT * FROM users WHERE email = ?",
        &[Value::from(email)],
    )
    .await
}
