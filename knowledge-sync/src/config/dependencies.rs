//! Dependency initialization and wiring for the knowledge sync service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{ConnectionMode, LedgerBackend, SyncConfig};
use crate::consumer::KafkaConsumer;
use crate::monitoring::PipelineMonitor;
use crate::orchestrator::ConsumerLoop;
use crate::SyncError;
use knowledge_sync_repository::opensearch::IndexConfig;
use knowledge_sync_repository::{
    DocumentIndexProvider, InMemoryProcessedLedger, OpenSearchProvider, PostgresProcessedLedger,
    ProcessedLedger,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured consumer loop ready to run.
    pub consumer_loop: Arc<ConsumerLoop>,
    /// Stats and health handle shared with the status server.
    pub monitor: PipelineMonitor,
    /// Where the status server binds.
    pub status_addr: SocketAddr,
}

impl Dependencies {
    /// Initialize all dependencies.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(SyncError)` - If initialization fails (OpenSearch only fails in fail-fast mode)
    pub async fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        info!(
            opensearch_url = %config.opensearch_url,
            kafka_broker = %config.kafka.brokers,
            kafka_group_id = %config.kafka.group_id,
            kafka_topic = %config.kafka.topic,
            ledger_backend = ?config.ledger_backend,
            connection_mode = ?config.connection_mode,
            retry_interval_secs = config.retry_interval.as_secs(),
            "Initializing dependencies"
        );

        // Initialize OpenSearch provider with retry logic
        let index_provider = Self::connect_to_opensearch(
            &config.opensearch_url,
            config.index.clone(),
            config.connection_mode,
            config.retry_interval,
        )
        .await?;

        info!("OpenSearch connection established");

        let ledger = Self::create_ledger(config).await?;

        let consumer = KafkaConsumer::new(&config.kafka)
            .map_err(|e| SyncError::config(format!("Failed to create Kafka consumer: {}", e)))?;

        info!("Kafka consumer created");

        let consumer_loop = Arc::new(ConsumerLoop::new(
            Arc::new(consumer),
            Arc::new(index_provider),
            ledger,
            config.pipeline.clone(),
        ));
        let monitor = consumer_loop.monitor();

        Ok(Self {
            consumer_loop,
            monitor,
            status_addr: config.status_addr,
        })
    }

    /// Create the processed-event ledger for the configured backend.
    async fn create_ledger(config: &SyncConfig) -> Result<Arc<dyn ProcessedLedger>, SyncError> {
        match config.ledger_backend {
            LedgerBackend::Postgres => {
                let ledger = PostgresProcessedLedger::connect(&config.database_url)
                    .await
                    .map_err(|e| {
                        SyncError::config(format!("Failed to initialize ledger database: {}", e))
                    })?;
                info!("PostgreSQL ledger ready");
                Ok(Arc::new(ledger))
            }
            LedgerBackend::Memory => {
                warn!("Using in-memory ledger, duplicates are only detected until restart");
                Ok(Arc::new(InMemoryProcessedLedger::new()))
            }
        }
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    ///
    /// A connection only counts once the versioned index and its alias exist.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, SyncError> {
        loop {
            match Self::try_connect_opensearch(url, index_config.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(SyncError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Attempt to connect to OpenSearch and prepare the index.
    async fn try_connect_opensearch(
        url: &str,
        index_config: IndexConfig,
    ) -> Result<OpenSearchProvider, SyncError> {
        let provider = OpenSearchProvider::new(url, index_config)
            .await
            .map_err(|e| SyncError::config(format!("Failed to create OpenSearch provider: {}", e)))?;

        provider
            .ensure_index_exists()
            .await
            .map_err(|e| SyncError::config(format!("Failed to ensure index exists: {}", e)))?;

        Ok(provider)
    }
}
