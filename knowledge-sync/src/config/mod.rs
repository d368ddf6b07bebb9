//! Configuration for the knowledge sync service.
//!
//! All settings come from environment variables (after `.env` is loaded), each falling
//! back to a default.

mod dependencies;

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use knowledge_sync_repository::opensearch::IndexConfig;
use tracing::warn;

use crate::admission::{CircuitBreakerConfig, RateLimiterConfig};
use crate::consumer::KafkaConsumerConfig;
use crate::loader::DEFAULT_CALL_TIMEOUT;
use crate::monitoring::DEFAULT_MAX_ERRORS;
use crate::SyncError;

pub use dependencies::Dependencies;

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "knowledge-sync";

/// Default source topic.
const DEFAULT_KAFKA_TOPIC: &str = "knowledge.documents";

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default index alias.
const DEFAULT_INDEX_ALIAS: &str = "documents";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Default ledger database.
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/knowledge_sync";

/// Default redelivery pause in milliseconds.
const DEFAULT_REDELIVERY_DELAY_MS: u64 = 1000;

/// Default status server bind address.
const DEFAULT_STATUS_ADDR: &str = "0.0.0.0:8080";

/// Interval between progress log lines.
const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Size of the consumer channels.
const DEFAULT_CHANNEL_BUFFER_SIZE: usize = 16;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry the connection until it succeeds.
    Retry,
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive). Anything else is `Retry`.
    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Where processed fingerprints are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Postgres,
    /// Process-local; duplicates are only detected until restart.
    Memory,
}

impl FromStr for LedgerBackend {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(SyncError::config(format!(
                "Unknown LEDGER_BACKEND '{}', expected 'postgres' or 'memory'",
                other
            ))),
        }
    }
}

/// Settings for the per-message pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub circuit_breaker: CircuitBreakerConfig,
    pub rate_limiter: RateLimiterConfig,
    /// Bound on each index and ledger call.
    pub call_timeout: Duration,
    /// Error count above which health turns unhealthy.
    pub max_errors: u64,
    pub progress_interval: Duration,
    pub channel_buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            circuit_breaker: CircuitBreakerConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_errors: DEFAULT_MAX_ERRORS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            channel_buffer_size: DEFAULT_CHANNEL_BUFFER_SIZE,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub kafka: KafkaConsumerConfig,
    pub opensearch_url: String,
    pub index: IndexConfig,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub ledger_backend: LedgerBackend,
    pub database_url: String,
    pub pipeline: PipelineConfig,
    pub status_addr: SocketAddr,
}

impl SyncConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group ID (default: knowledge-sync)
    /// - `KAFKA_TOPIC`: Source topic (default: knowledge.documents)
    /// - `KAFKA_USERNAME` / `KAFKA_PASSWORD`: SASL credentials (optional, enables SASL/SSL)
    /// - `KAFKA_SSL_CA_PEM`: Custom CA certificate in PEM format (optional)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_ALIAS`: Index alias name (default: documents)
    /// - `DOCUMENTS_INDEX_VERSION`: Index version number (default: 0)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `LEDGER_BACKEND`: "postgres" or "memory" (default: postgres)
    /// - `DATABASE_URL`: Ledger database (default: postgres://localhost/knowledge_sync)
    /// - `CIRCUIT_BREAKER_FAILURE_THRESHOLD`: Failures that open the breaker (default: 5)
    /// - `CIRCUIT_BREAKER_COOLDOWN_SECS`: Open time before a probe (default: 60)
    /// - `RATE_LIMIT_PER_MINUTE`: Index operations per minute (default: 30)
    /// - `CALL_TIMEOUT_SECS`: Bound on index and ledger calls (default: 30)
    /// - `MAX_ERRORS`: Health error ceiling (default: 100)
    /// - `REDELIVERY_DELAY_MS`: Pause before re-reading a deferred message (default: 1000)
    /// - `STATUS_ADDR`: Status server bind address (default: 0.0.0.0:8080)
    pub fn from_env() -> Result<Self, SyncError> {
        let defaults = PipelineConfig::default();

        let mut kafka = KafkaConsumerConfig::new(
            env_or("KAFKA_BROKER", DEFAULT_KAFKA_BROKER),
            env_or("KAFKA_GROUP_ID", DEFAULT_KAFKA_GROUP_ID),
            env_or("KAFKA_TOPIC", DEFAULT_KAFKA_TOPIC),
        )
        .with_redelivery_delay(Duration::from_millis(env_parse(
            "REDELIVERY_DELAY_MS",
            DEFAULT_REDELIVERY_DELAY_MS,
        )));
        if let (Ok(username), Ok(password)) = (env::var("KAFKA_USERNAME"), env::var("KAFKA_PASSWORD"))
        {
            kafka = kafka.with_credentials(username, password);
        }
        if let Ok(ca_pem) = env::var("KAFKA_SSL_CA_PEM") {
            kafka = kafka.with_ssl_ca(ca_pem);
        }

        let pipeline = PipelineConfig {
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: env_parse(
                    "CIRCUIT_BREAKER_FAILURE_THRESHOLD",
                    defaults.circuit_breaker.failure_threshold,
                ),
                cool_down: Duration::from_secs(env_parse(
                    "CIRCUIT_BREAKER_COOLDOWN_SECS",
                    defaults.circuit_breaker.cool_down.as_secs(),
                )),
            },
            rate_limiter: RateLimiterConfig {
                max_per_window: env_parse(
                    "RATE_LIMIT_PER_MINUTE",
                    defaults.rate_limiter.max_per_window,
                ),
                window: defaults.rate_limiter.window,
            },
            call_timeout: Duration::from_secs(env_parse(
                "CALL_TIMEOUT_SECS",
                defaults.call_timeout.as_secs(),
            )),
            max_errors: env_parse("MAX_ERRORS", defaults.max_errors),
            ..defaults
        };

        let status_addr = env_or("STATUS_ADDR", DEFAULT_STATUS_ADDR)
            .parse::<SocketAddr>()
            .map_err(|e| SyncError::config(format!("Invalid STATUS_ADDR: {}", e)))?;

        Ok(Self {
            kafka,
            opensearch_url: env_or("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
            index: IndexConfig::new(
                env_or("INDEX_ALIAS", DEFAULT_INDEX_ALIAS),
                env_parse("DOCUMENTS_INDEX_VERSION", 0u32),
            ),
            connection_mode: ConnectionMode::parse(&env_or("OPENSEARCH_CONNECTION_MODE", "retry")),
            retry_interval: Duration::from_secs(env_parse(
                "OPENSEARCH_RETRY_INTERVAL_SECS",
                DEFAULT_RETRY_INTERVAL_SECS,
            )),
            ledger_backend: env_or("LEDGER_BACKEND", "postgres").parse()?,
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            pipeline,
            status_addr,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
