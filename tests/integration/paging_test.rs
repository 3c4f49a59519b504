//! Paged route reads against the SQLite fixture store.

use super::fixture::{empty_store, seeded_store, NEIGHBOR, OWNER};
use farm_records::db::Value;
use farm_records::error::FarmError;
use farm_records::paging::{OwnerId, PageRequest, PagedQueryExecutor};
use farm_records::registry::Route;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_empty_store_returns_no_rows_and_no_pages() {
    let store = empty_store().await;
    let executor = PagedQueryExecutor::new(&store);

    let result = executor
        .execute_named("livestock", OwnerId(OWNER), 0, 5)
        .await
        .unwrap();

    assert!(result.rows.is_empty());
    assert_eq!(result.total_pages, 0);
    assert!(result.fields.iter().any(|f| f.name == "livestock_id"));
}

#[tokio::test]
async fn test_livestock_pages() {
    let store = seeded_store().await;
    let executor = PagedQueryExecutor::new(&store);

    let first = executor
        .execute(&PageRequest::for_page(Route::Livestock, OwnerId(OWNER), 1, 5).unwrap())
        .await
        .unwrap();
    let last = executor
        .execute(&PageRequest::for_page(Route::Livestock, OwnerId(OWNER), 3, 5).unwrap())
        .await
        .unwrap();

    assert_eq!(first.total_pages, 3);
    assert_eq!(first.rows.len(), 5);
    assert_eq!(first.rows[0].get("Livestock Id"), Some(&Value::Int(1)));
    assert_eq!(first.rows[0].get("Birth Date"), Some(&Value::from("2021-03-01")));

    assert_eq!(last.total_pages, 3);
    let ids: Vec<_> = last
        .rows
        .iter()
        .map(|r| r.get("Livestock Id").cloned())
        .collect();
    assert_eq!(ids, vec![Some(Value::Int(11)), Some(Value::Int(12))]);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let store = seeded_store().await;
    let executor = PagedQueryExecutor::new(&store);

    let result = executor
        .execute(&PageRequest::for_page(Route::Livestock, OwnerId(OWNER), 9, 5).unwrap())
        .await
        .unwrap();

    assert!(result.rows.is_empty());
    assert_eq!(result.total_pages, 3);
}

#[tokio::test]
async fn test_rows_are_scoped_to_owner() {
    let store = seeded_store().await;
    let executor = PagedQueryExecutor::new(&store);

    let result = executor
        .execute(&PageRequest::new(Route::Livestock, OwnerId(NEIGHBOR), 0, 5))
        .await
        .unwrap();

    assert_eq!(result.total_pages, 1);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("Tag"), Some(&Value::from("N-001")));
}

#[tokio::test]
async fn test_integer_millisecond_dates_are_normalized() {
    let store = seeded_store().await;
    let executor = PagedQueryExecutor::new(&store);

    let result = executor
        .execute(&PageRequest::new(Route::Livestock, OwnerId(NEIGHBOR), 0, 5))
        .await
        .unwrap();

    assert_eq!(result.rows[0].get("Birth Date"), Some(&Value::from("2023-05-01")));
}

#[tokio::test]
async fn test_medication_dates_are_normalized() {
    let store = seeded_store().await;
    let executor = PagedQueryExecutor::new(&store);

    let result = executor
        .execute(&PageRequest::new(Route::Medication, OwnerId(OWNER), 0, 5))
        .await
        .unwrap();

    assert_eq!(result.rows.len(), 2);
    let keys: Vec<&str> = result.rows[0].keys().collect();
    assert_eq!(
        keys,
        vec![
            "Livestock Id",
            "Med Id",
            "Medication Name",
            "Start Date",
            "End Date",
            "Med Interval"
        ]
    );
    assert_eq!(result.rows[0].get("Start Date"), Some(&Value::from("2023-05-01")));
    assert_eq!(result.rows[1].get("Start Date"), Some(&Value::from("2024-01-15")));
    assert_eq!(result.rows[1].get("End Date"), Some(&Value::Null));

    // Raw column names are reported untouched.
    assert_eq!(result.fields[3].name, "start_date");
}

#[tokio::test]
async fn test_pasture_maintenance_count_matches_rows() {
    let store = seeded_store().await;
    let executor = PagedQueryExecutor::new(&store);

    let result = executor
        .execute(&PageRequest::new(Route::PastureMaintenance, OwnerId(OWNER), 5, 5))
        .await
        .unwrap();

    // Six maintenance jobs on three pastures: two pages, one row on the second.
    assert_eq!(result.total_pages, 2);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(
        result.rows[0].get("Maintenance Type"),
        Some(&Value::from("Fence repair"))
    );
}

#[tokio::test]
async fn test_every_route_runs_against_the_schema() {
    let store = seeded_store().await;
    let executor = PagedQueryExecutor::new(&store);

    for route in Route::ALL {
        let result = executor
            .execute(&PageRequest::new(route, OwnerId(OWNER), 0, 5))
            .await
            .unwrap_or_else(|e| panic!("{route}: {e}"));

        assert!(!result.rows.is_empty(), "{route} returned no rows");
        assert!(result.rows.len() <= 5, "{route}");
        assert!(result.total_pages >= 1, "{route}");
    }
}

#[tokio::test]
async fn test_unknown_route_touches_nothing() {
    let store = seeded_store().await;
    let executor = PagedQueryExecutor::new(&store);

    let err = executor
        .execute_named("Livestock", OwnerId(OWNER), 0, 5)
        .await
        .unwrap_err();

    assert!(matches!(err, FarmError::UnknownRoute(name) if name == "Livestock"));
}

#[tokio::test]
async fn test_missing_table_is_query_execution_error() {
    let store = empty_store().await;
    store.execute_script("DROP TABLE calves;").await.unwrap();
    let executor = PagedQueryExecutor::new(&store);

    let err = executor
        .execute(&PageRequest::new(Route::Calves, OwnerId(OWNER), 0, 5))
        .await
        .unwrap_err();

    assert!(matches!(err, FarmError::QueryExecution(_)), "got {err:?}");
}
