//! Integration tests for the PostgreSQL processed-event ledger.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup.
//!
//! Run with: `cargo test --test postgres_ledger`

use knowledge_sync_repository::{InsertOutcome, PostgresProcessedLedger, ProcessedLedger};
use knowledge_sync_shared::{EventKind, ProcessedRecord};

fn make_test_record(fingerprint: &str) -> ProcessedRecord {
    ProcessedRecord::new(fingerprint, "doc-1", EventKind::Created, 42)
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_insert_and_exists(pool: sqlx::PgPool) {
    let ledger = PostgresProcessedLedger::new(pool.clone());
    let record = make_test_record("fp-1");

    assert!(!ledger.exists("fp-1").await.unwrap());
    assert_eq!(ledger.insert(&record).await.unwrap(), InsertOutcome::Inserted);
    assert!(ledger.exists("fp-1").await.unwrap());

    let (document_id, event_kind, processing_time_ms): (String, String, i64) = sqlx::query_as(
        "SELECT document_id, event_kind, processing_time_ms FROM processed_events WHERE fingerprint = $1",
    )
    .bind("fp-1")
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(document_id, "doc-1");
    assert_eq!(event_kind, "created");
    assert_eq!(processing_time_ms, 42);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_duplicate_fingerprint_is_not_an_error(pool: sqlx::PgPool) {
    let ledger = PostgresProcessedLedger::new(pool.clone());
    let record = make_test_record("fp-dup");

    assert_eq!(ledger.insert(&record).await.unwrap(), InsertOutcome::Inserted);
    assert_eq!(
        ledger.insert(&record).await.unwrap(),
        InsertOutcome::AlreadyPresent
    );

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_events WHERE fingerprint = $1")
        .bind("fp-dup")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_distinct_fingerprints_for_same_document(pool: sqlx::PgPool) {
    let ledger = PostgresProcessedLedger::new(pool.clone());

    ledger.insert(&make_test_record("fp-v1")).await.unwrap();
    ledger.insert(&make_test_record("fp-v2")).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_events WHERE document_id = $1")
        .bind("doc-1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 2);
}
