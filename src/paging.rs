//! Paged, owner-scoped reads.
//!
//! Binds a route's entity and count templates, runs both, derives the page
//! count and normalizes the rows for display.

use crate::db::{ColumnInfo, DatabaseClient, Value};
use crate::error::{FarmError, Result};
use crate::normalize::{normalize, Record};
use crate::registry::{self, Route, RouteDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Identity of the authenticated owner whose records are being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One window of a route's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub route: Route,
    pub owner: OwnerId,
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Creates a request for an explicit offset/limit window.
    pub fn new(route: Route, owner: OwnerId, offset: i64, limit: i64) -> Self {
        Self {
            route,
            owner,
            offset,
            limit,
        }
    }

    /// Creates a request for a 1-based page number.
    pub fn for_page(
        route: Route,
        owner: OwnerId,
        page_number: i64,
        page_size: i64,
    ) -> Result<Self> {
        let offset = page_offset(page_number, page_size)?;
        Ok(Self::new(route, owner, offset, page_size))
    }
}

/// Offset of the first row on a 1-based page.
pub fn page_offset(page_number: i64, page_size: i64) -> Result<i64> {
    if page_size <= 0 {
        return Err(FarmError::InvalidPageSize(page_size));
    }
    if page_number < 1 {
        return Err(FarmError::InvalidPageNumber(page_number));
    }
    (page_number - 1)
        .checked_mul(page_size)
        .ok_or(FarmError::InvalidPageNumber(page_number))
}

/// Number of pages needed for `count` rows at `limit` rows per page.
pub fn total_pages(count: u64, limit: i64) -> Result<u64> {
    if limit <= 0 {
        return Err(FarmError::InvalidPageSize(limit));
    }
    Ok(count.div_ceil(limit as u64))
}

/// A normalized page of records.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub rows: Vec<Record>,
    pub fields: Vec<ColumnInfo>,
    pub total_pages: u64,
}

/// Runs paged queries against a database client.
pub struct PagedQueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> PagedQueryExecutor<'a> {
    /// Creates a new executor.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// Resolves a route by wire name and runs it.
    pub async fn execute_named(
        &self,
        route: &str,
        owner: OwnerId,
        offset: i64,
        limit: i64,
    ) -> Result<PageResult> {
        let descriptor = registry::lookup(route)?;
        self.run(descriptor, owner, offset, limit).await
    }

    /// Fetches one page of the request's route.
    ///
    /// Either query failing fails the whole call with [`FarmError::QueryExecution`];
    /// no partial result is returned.
    pub async fn execute(&self, request: &PageRequest) -> Result<PageResult> {
        self.run(
            request.route.descriptor(),
            request.owner,
            request.offset,
            request.limit,
        )
        .await
    }

    /// Like [`execute`](Self::execute), abandoning the queries when `cancel` fires.
    pub async fn execute_with_cancel(
        &self,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<PageResult> {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Paged query for {} cancelled", request.route);
                Err(FarmError::Cancelled)
            }
            result = self.execute(request) => result,
        }
    }

    async fn run(
        &self,
        descriptor: &'static RouteDescriptor,
        owner: OwnerId,
        offset: i64,
        limit: i64,
    ) -> Result<PageResult> {
        if limit <= 0 {
            return Err(FarmError::InvalidPageSize(limit));
        }
        if offset < 0 {
            return Err(FarmError::invalid_input(format!(
                "offset must not be negative, got {offset}"
            )));
        }

        info!("Performing paged query for route {}", descriptor.name);
        debug!("Offset/limit: {offset}/{limit}, owner: {owner}");

        let entity_params = [Value::Int(owner.0), Value::Int(offset), Value::Int(limit)];
        let count_params = [Value::Int(owner.0)];

        // The two reads are independent; the first failure drops the other.
        let (entities, counted) = tokio::try_join!(
            self.db.execute(descriptor.entity_query, &entity_params),
            self.db.execute(descriptor.count_query, &count_params),
        )
        .map_err(FarmError::query_execution)?;

        let count = counted
            .scalar()
            .and_then(Value::as_i64)
            .and_then(|count| u64::try_from(count).ok())
            .ok_or_else(|| {
                FarmError::query_execution(FarmError::query(format!(
                    "count query for {} returned no row count",
                    descriptor.name
                )))
            })?;
        let total_pages = total_pages(count, limit)?;

        let mut rows = entities.rows;
        if rows.len() > limit as usize {
            warn!(
                "Route {} returned {} rows for a page of {limit}; truncating",
                descriptor.name,
                rows.len()
            );
            rows.truncate(limit as usize);
        }

        let records = normalize(&rows, &entities.columns);

        info!(
            "Paged query for {} returned {} of {count} rows ({total_pages} pages)",
            descriptor.name,
            records.len()
        );

        Ok(PageResult {
            rows: records,
            fields: entities.columns,
            total_pages,
        })
    }
}
