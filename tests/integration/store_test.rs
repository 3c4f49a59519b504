//! Insert, update and delete against the SQLite fixture store.

use super::fixture::{seeded_store, OWNER};
use farm_records::db::{DatabaseClient, Value};
use farm_records::error::FarmError;
use farm_records::store::{delete_entity, insert_entity, update_entity, Fields, Table};
use pretty_assertions::assert_eq;

fn fields(pairs: &[(&str, Value)]) -> Fields {
    pairs
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn test_insert_update_delete_pasture() {
    let store = seeded_store().await;

    let inserted = insert_entity(
        &store,
        Table::Pastures,
        &fields(&[
            ("owner_id", Value::Int(OWNER)),
            ("name", Value::from("O'Brien Lot")),
            ("acreage", Value::Float(4.0)),
        ]),
    )
    .await
    .unwrap();
    assert_eq!(inserted.rows_affected, 1);
    let pasture_id = inserted.last_insert_id.unwrap();

    let updated = update_entity(
        &store,
        Table::Pastures,
        &fields(&[("pasture_id", Value::Int(pasture_id)), ("owner_id", Value::Int(OWNER))]),
        &fields(&[("acreage", Value::Float(6.5))]),
    )
    .await
    .unwrap();
    assert_eq!(updated.rows_affected, 1);

    let row = store
        .execute(
            "SELECT name, acreage FROM pastures WHERE pasture_id = ?",
            &[Value::Int(pasture_id)],
        )
        .await
        .unwrap();
    assert_eq!(
        row.rows,
        vec![vec![Value::from("O'Brien Lot"), Value::Float(6.5)]]
    );

    let deleted = delete_entity(
        &store,
        Table::Pastures,
        &fields(&[("pasture_id", Value::Int(pasture_id))]),
    )
    .await
    .unwrap();
    assert_eq!(deleted.rows_affected, 1);
}

#[tokio::test]
async fn test_update_matches_all_identifying_columns() {
    let store = seeded_store().await;

    // Pasture 1 belongs to OWNER, so this pair matches nothing.
    let updated = update_entity(
        &store,
        Table::Pastures,
        &fields(&[("pasture_id", Value::Int(1)), ("owner_id", Value::Int(999))]),
        &fields(&[("name", Value::from("Stolen"))]),
    )
    .await
    .unwrap();

    assert_eq!(updated.rows_affected, 0);
}

#[tokio::test]
async fn test_hostile_column_name_is_rejected() {
    let store = seeded_store().await;

    let err = delete_entity(
        &store,
        Table::Livestock,
        &fields(&[("1=1 OR livestock_id", Value::Int(1))]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FarmError::InvalidInput(_)));
    let remaining = store
        .execute("SELECT count(*) FROM livestock", &[])
        .await
        .unwrap();
    assert_eq!(remaining.scalar().and_then(Value::as_i64), Some(13));
}

#[tokio::test]
async fn test_duplicate_email_is_constraint_violation() {
    let store = seeded_store().await;

    let err = insert_entity(
        &store,
        Table::Users,
        &fields(&[
            ("email", Value::from(super::fixture::OWNER_EMAIL)),
            ("password_hash", Value::from("x")),
        ]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FarmError::ConstraintViolation(_)), "got {err:?}");
}
