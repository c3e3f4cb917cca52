use serde::Deserialize;
use wayfare_database::*;

const BOOKING_V1: Migration = Migration::new(
    "booking",
    "001",
    "DEFINE TABLE IF NOT EXISTS booking SCHEMALESS;
     DEFINE INDEX IF NOT EXISTS booking_uid ON TABLE booking FIELDS uid;",
);

#[tokio::test]
async fn connect_in_memory_and_health_check() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    db.health().await.expect("health check");
    assert_eq!(db.namespace(), "test_ns");
    assert_eq!(db.database(), "test_db");
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));

    let err = Database::builder().url("mem://").init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[tokio::test]
async fn migrations_apply_once_and_are_recorded() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "migrations")
        .migrations([BOOKING_V1])
        .init()
        .await
        .expect("init with migrations");

    let rerun = db.migrate(&[BOOKING_V1]).await.expect("second run");
    assert!(rerun.applied.is_empty());
    assert_eq!(rerun.skipped.len(), 1);
    assert_eq!(rerun.skipped[0].checksum, BOOKING_V1.checksum());

    #[derive(Debug, Deserialize)]
    struct Row {
        slice: String,
        version: String,
    }
    let rows: Vec<Row> = db.select("migration").await.expect("select migrations");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].slice, "booking");
    assert_eq!(rows[0].version, "001");
}

#[tokio::test]
async fn edited_migration_is_rejected() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "drift")
        .migrations([BOOKING_V1])
        .init()
        .await
        .expect("init with migrations");

    let edited = Migration::new("booking", "001", "DEFINE TABLE IF NOT EXISTS booking SCHEMAFULL;");
    let err = db.migrate(&[edited]).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Migration { .. }));
}

#[tokio::test]
async fn failing_script_surfaces_surreal_error() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "broken")
        .init()
        .await
        .expect("connect to mem://");

    let broken = Migration::new("broken", "001", "THIS IS NOT SURREALQL;");
    let err = db.migrate(&[broken]).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Surreal { .. }));
}
