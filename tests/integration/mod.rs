//! Integration tests for farm-records.

pub mod fixture;
pub mod mysql_test;
pub mod paging_test;
pub mod router_test;
pub mod store_test;
