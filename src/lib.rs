//! farm-records - the data layer of a farm record-keeping application.
//!
//! A fixed registry of owner-scoped listing routes, a paged query executor, and
//! display normalization of the rows it returns. Writes, sign-in and a request
//! router round out what a front end needs.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod paging;
pub mod registry;
pub mod router;
pub mod session;
pub mod store;
