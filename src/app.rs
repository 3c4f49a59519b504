//! Application context.
//!
//! Holds the database handle, application settings and the signed-in user.
//! Created once at startup; the session is set by sign-in or sign-up and
//! cleared by sign-out.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{DatabaseClient, QueryResult, Value};
use crate::error::{FarmError, Result};
use crate::paging::{OwnerId, PageRequest, PageResult, PagedQueryExecutor};
use crate::registry::Route;
use crate::session::{self, Credentials, User};
use crate::store::{self, Fields, Table};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything a request handler needs.
pub struct AppContext {
    db: Arc<dyn DatabaseClient>,
    config: AppConfig,
    session: Option<User>,
}

impl AppContext {
    /// Creates a context with no signed-in user.
    pub fn new(db: Arc<dyn DatabaseClient>, config: AppConfig) -> Self {
        Self {
            db,
            config,
            session: None,
        }
    }

    /// Returns the database client.
    pub fn db(&self) -> &dyn DatabaseClient {
        self.db.as_ref()
    }

    /// Records per page.
    pub fn page_size(&self) -> i64 {
        self.config.page_size
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref()
    }

    /// The signed-in user's owner id.
    pub fn require_owner(&self) -> Result<OwnerId> {
        self.session
            .as_ref()
            .map(User::owner_id)
            .ok_or_else(|| FarmError::auth("Not signed in"))
    }

    /// Verifies credentials and starts a session.
    pub async fn sign_in(&mut self, credentials: &Credentials) -> Result<&User> {
        info!("Verifying credentials for {}", credentials.email);
        let user = session::authenticate(self.db(), credentials).await?;
        info!("User {} signed in", user.user_id);
        Ok(self.session.insert(user))
    }

    /// Registers a new user and starts a session for them.
    ///
    /// `profile` holds any additional `users` columns; the password is stored hashed.
    pub async fn sign_up(&mut self, credentials: &Credentials, profile: Fields) -> Result<&User> {
        credentials.validate()?;
        info!("Attempting to sign user up: {}", credentials.email);

        if session::find_user(self.db(), &credentials.email).await?.is_some() {
            info!("User already exists. Cannot sign up");
            return Err(FarmError::auth("Email already registered"));
        }

        let mut entity: Fields = profile
            .into_iter()
            .filter(|(column, _)| column != "email" && column != "password_hash")
            .collect();
        entity.push(("email".to_string(), Value::from(credentials.email.as_str())));
        entity.push((
            "password_hash".to_string(),
            Value::from(session::hash_password(&credentials.password)),
        ));
        store::insert_entity(self.db(), Table::Users, &entity).await?;

        let user = session::find_user(self.db(), &credentials.email)
            .await?
            .ok_or_else(|| FarmError::internal("Newly inserted user could not be read back"))?;
        info!("User {} signed up", user.user_id);
        Ok(self.session.insert(user))
    }

    /// Ends the current session.
    pub fn sign_out(&mut self) {
        if let Some(user) = self.session.take() {
            info!("User {} signed out", user.user_id);
        }
    }

    /// Fetches a page of `route` for the signed-in user.
    pub async fn page(
        &self,
        route: Route,
        page_number: i64,
        cancel: &CancellationToken,
    ) -> Result<PageResult> {
        let owner = self.require_owner()?;
        let request = PageRequest::for_page(route, owner, page_number, self.page_size())?;
        PagedQueryExecutor::new(self.db())
            .execute_with_cancel(&request, cancel)
            .await
    }

    /// Inserts a row. Requires a session.
    pub async fn insert(&self, table: Table, entity: &Fields) -> Result<QueryResult> {
        self.require_owner()?;
        store::insert_entity(self.db(), table, entity).await
    }

    /// Updates matching rows. Requires a session.
    pub async fn update(
        &self,
        table: Table,
        identifying: &Fields,
        changes: &Fields,
    ) -> Result<QueryResult> {
        self.require_owner()?;
        store::update_entity(self.db(), table, identifying, changes).await
    }

    /// Deletes matching rows. Requires a session.
    pub async fn delete(&self, table: Table, identifying: &Fields) -> Result<QueryResult> {
        self.require_owner()?;
        store::delete_entity(self.db(), table, identifying).await
    }
}
