//! PostgreSQL-backed processed-event ledger.
//!
//! Stores one row per handled event fingerprint in the `processed_events` table. The
//! primary key on `fingerprint` is what makes concurrent duplicate handling safe.

use async_trait::async_trait;
use knowledge_sync_shared::ProcessedRecord;
use tracing::{debug, info};

use crate::errors::LedgerError;
use crate::interfaces::ProcessedLedger;
use crate::types::InsertOutcome;

/// PostgreSQL-backed ledger.
pub struct PostgresProcessedLedger {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
}

impl PostgresProcessedLedger {
    /// Creates a ledger over an existing pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url` and runs pending migrations.
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresProcessedLedger)` - Ready-to-use ledger with the schema in place
    /// * `Err(LedgerError)` - If the connection or a migration fails
    pub async fn connect(url: &str) -> Result<Self, LedgerError> {
        let pool = sqlx::PgPool::connect(url).await?;
        let ledger = Self::new(pool);
        ledger.run_migrations().await?;
        Ok(ledger)
    }

    /// Applies the embedded schema migrations.
    pub async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("src/postgres/migrations")
            .run(&self.pool)
            .await?;
        info!("Processed-event ledger migrations applied");
        Ok(())
    }
}

#[async_trait]
impl ProcessedLedger for PostgresProcessedLedger {
    async fn exists(&self, fingerprint: &str) -> Result<bool, LedgerError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM processed_events WHERE fingerprint = $1)",
        )
        .bind(fingerprint)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, record: &ProcessedRecord) -> Result<InsertOutcome, LedgerError> {
        let result = sqlx::query(
            "INSERT INTO processed_events (fingerprint, document_id, event_kind, processing_time_ms, processed_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (fingerprint) DO NOTHING",
        )
        .bind(&record.fingerprint)
        .bind(&record.document_id)
        .bind(record.event_kind.as_str())
        .bind(i64::try_from(record.processing_time_ms).unwrap_or(i64::MAX))
        .bind(record.processed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(fingerprint = %record.fingerprint, "Fingerprint already recorded");
            return Ok(InsertOutcome::AlreadyPresent);
        }

        Ok(InsertOutcome::Inserted)
    }
}
