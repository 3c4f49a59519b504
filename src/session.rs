//! Users, credentials and password hashing.

use crate::db::{DatabaseClient, QueryResult, Value};
use crate::error::{FarmError, Result};
use crate::paging::OwnerId;
use crate::store;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// An authenticated farm owner.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl User {
    /// The owner id used to scope reads.
    pub fn owner_id(&self) -> OwnerId {
        OwnerId(self.user_id)
    }

    /// Reads the first user row of a `SELECT * FROM users` result.
    pub fn from_result(result: &QueryResult) -> Result<Option<Self>> {
        let Some(row) = result.rows.first() else {
            return Ok(None);
        };

        let user_id = result
            .get(row, "user_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| FarmError::internal("users row has no integer user_id"))?;
        let email = result
            .get(row, "email")
            .and_then(Value::as_str)
            .ok_or_else(|| FarmError::internal("users row has no email"))?;
        let password_hash = result
            .get(row, "password_hash")
            .and_then(Value::as_str)
            .ok_or_else(|| FarmError::internal("users row has no password_hash"))?;

        Ok(Some(Self {
            user_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        }))
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Email and plaintext password as typed at the login prompt.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Rejects blank fields before any lookup happens.
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(FarmError::auth("Malformed credentials: email and password are required"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Lowercase hex SHA-256 of the password.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Compares a plaintext password with a stored hash, ignoring hex case.
pub fn password_matches(password: &str, stored_hash: &str) -> bool {
    hash_password(password).eq_ignore_ascii_case(stored_hash)
}

/// Looks up a user by email.
pub async fn find_user(db: &dyn DatabaseClient, email: &str) -> Result<Option<User>> {
    let result = store::user_by_email(db, email).await?;
    User::from_result(&result)
}

/// Checks credentials against the users table.
pub async fn authenticate(db: &dyn DatabaseClient, credentials: &Credentials) -> Result<User> {
    credentials.validate()?;

    match find_user(db, &credentials.email).await? {
        Some(user) if password_matches(&credentials.password, &user.password_hash) => Ok(user),
        _ => Err(FarmError::auth("Invalid email and password combination")),
    }
}
