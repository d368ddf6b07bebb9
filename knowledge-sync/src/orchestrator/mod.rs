//! Orchestrator module for the knowledge sync pipeline.
//!
//! Coordinates the consumer, admission control, idempotence, processor and loader for
//! every message.

mod outcome;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use knowledge_sync_repository::{DocumentIndexProvider, ProcessedLedger};
use knowledge_sync_shared::DocumentEvent;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

use crate::admission::{CircuitBreaker, RateLimiter};
use crate::config::PipelineConfig;
use crate::consumer::{Consumer, StreamMessage};
use crate::errors::IngestError;
use crate::idempotence::{IdempotenceGuard, MessageHasher};
use crate::loader::DocumentLoader;
use crate::monitoring::{PipelineMonitor, RunStatistics};
use crate::processor::{EventRouter, EventValidator};

pub use outcome::MessageOutcome;

/// Bytes of an unparsable payload included in the error log.
const PAYLOAD_PREVIEW_BYTES: usize = 256;

/// The consumer loop.
///
/// Processes messages strictly one at a time. For every message it:
/// 1. parses the envelope
/// 2. skips fingerprints already in the ledger
/// 3. asks the circuit breaker for permission
/// 4. validates the event (invalid events are recorded and skipped)
/// 5. asks the rate limiter for permission (index work only)
/// 6. applies the routed action through the loader
/// 7. records the fingerprint and reports success to the breaker
///
/// A downstream failure (index, ledger or timeout) is the only thing that feeds the
/// breaker's failure count. Messages that were denied admission or failed are left
/// uncommitted and come back through redelivery.
pub struct ConsumerLoop {
    consumer: Arc<dyn Consumer>,
    hasher: MessageHasher,
    guard: IdempotenceGuard,
    validator: EventValidator,
    router: EventRouter,
    loader: DocumentLoader,
    circuit_breaker: Arc<CircuitBreaker>,
    rate_limiter: Arc<RateLimiter>,
    statistics: Arc<RunStatistics>,
    running: Arc<AtomicBool>,
    config: PipelineConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl ConsumerLoop {
    /// Create a consumer loop with fresh admission state and counters.
    pub fn new(
        consumer: Arc<dyn Consumer>,
        provider: Arc<dyn DocumentIndexProvider>,
        ledger: Arc<dyn ProcessedLedger>,
        config: PipelineConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            consumer,
            hasher: MessageHasher::new(),
            guard: IdempotenceGuard::new(ledger, config.call_timeout),
            validator: EventValidator::new(),
            router: EventRouter::new(),
            loader: DocumentLoader::with_timeout(provider, config.call_timeout),
            circuit_breaker: Arc::new(CircuitBreaker::new(config.circuit_breaker.clone())),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limiter.clone())),
            statistics: Arc::new(RunStatistics::new()),
            running: Arc::new(AtomicBool::new(false)),
            config,
            shutdown_tx,
        }
    }

    /// A read-only handle for stats and health.
    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(
            Arc::clone(&self.circuit_breaker),
            Arc::clone(&self.rate_limiter),
            Arc::clone(&self.statistics),
            Arc::clone(&self.running),
            self.config.max_errors,
        )
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Run the consumer loop.
    ///
    /// Blocks until Ctrl-C, [`shutdown`](Self::shutdown) or the end of the stream. The
    /// message in flight when shutdown is requested is finished and acknowledged first.
    /// Returns the consumer's error if it stopped on one.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), IngestError> {
        info!("Starting knowledge sync consumer loop");

        self.loader.check_ready().await?;
        self.consumer.subscribe()?;

        let (event_transmitter, mut event_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);
        let (ack_transmitter, ack_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let consumer = Arc::clone(&self.consumer);
        let consumer_shutdown_rx = self.shutdown_tx.subscribe();
        let consumer_handle = tokio::spawn(async move {
            consumer
                .run(event_transmitter, ack_receiver, consumer_shutdown_rx)
                .await
        });

        let signal_tx = self.shutdown_tx.clone();
        let signal_handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
                let _ = signal_tx.send(());
            }
        });

        self.running.store(true, Ordering::SeqCst);
        info!("Ready to process events");

        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut prev_processed: u64 = 0;
        let mut prev_errors: u64 = 0;
        let mut prev_time = Instant::now();

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Consumer loop stopping");
                    break;
                }
                msg = event_receiver.recv() => {
                    match msg {
                        Some(StreamMessage::Payload { payload, offset }) => {
                            let outcome = self.handle_message(&payload).await;
                            debug!(offset = %offset, outcome = %outcome, "Message handled");

                            let ack = StreamMessage::Acknowledgment {
                                offset,
                                commit: outcome.should_commit(),
                            };
                            if ack_transmitter.send(ack).await.is_err() {
                                warn!("Acknowledgment channel closed");
                                break;
                            }
                        }
                        Some(StreamMessage::Error(e)) => {
                            error!(error = %e, "Received error from consumer");
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Consumer stream ended");
                            break;
                        }
                        Some(StreamMessage::Acknowledgment { .. }) => {
                            warn!("Received acknowledgment on event channel (should be on ack channel)");
                        }
                    }
                }
                _ = progress_timer.tick() => {
                    let processed = self.statistics.processed();
                    let errors = self.statistics.errors();

                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(prev_time).as_secs_f64();
                    let per_sec = |current: u64, previous: u64| {
                        if elapsed_secs > 0.0 {
                            (current.saturating_sub(previous) as f64) / elapsed_secs
                        } else {
                            0.0
                        }
                    };

                    info!(
                        events_processed = processed,
                        errors = errors,
                        events_per_sec = format!("{:.2}", per_sec(processed, prev_processed)),
                        errors_per_sec = format!("{:.2}", per_sec(errors, prev_errors)),
                        circuit_breaker_state = %self.circuit_breaker.state(),
                        current_rate = self.rate_limiter.current_rate(),
                        "Processing progress"
                    );

                    prev_processed = processed;
                    prev_errors = errors;
                    prev_time = now;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);

        // Release the channels and stop the consumer if it is still reading.
        drop(ack_transmitter);
        drop(event_receiver);
        let _ = self.shutdown_tx.send(());
        let consumer_result = match consumer_handle.await {
            Ok(result) => result,
            Err(e) => Err(IngestError::KafkaError(format!("consumer task failed: {}", e))),
        };
        signal_handle.abort();

        let stats = self.statistics.snapshot();
        info!(
            processed = stats.processed,
            skipped_duplicate = stats.skipped_duplicate,
            skipped_invalid = stats.skipped_invalid,
            skipped_rate_limited = stats.skipped_rate_limited,
            circuit_breaker_trips = stats.circuit_breaker_trips,
            errors = stats.errors,
            "Consumer loop shutdown complete"
        );

        if let Err(e) = &consumer_result {
            error!(error = %e, "Consumer stopped with an error");
        }
        consumer_result
    }

    /// Handle one raw message and report what happened to it.
    ///
    /// Never returns an error: every failure is absorbed into statistics, the circuit
    /// breaker and the returned outcome.
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub async fn handle_message(&self, payload: &[u8]) -> MessageOutcome {
        let started = Instant::now();

        let event = match DocumentEvent::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                self.statistics.record_error();
                let preview_len = payload.len().min(PAYLOAD_PREVIEW_BYTES);
                error!(
                    error = %e,
                    payload_preview = %String::from_utf8_lossy(&payload[..preview_len]),
                    "Malformed event envelope"
                );
                return MessageOutcome::Malformed;
            }
        };

        let fingerprint = self.hasher.fingerprint(&event);

        match self.guard.has_been_processed(&fingerprint).await {
            Ok(true) => {
                self.statistics.record_duplicate();
                debug!(
                    document_id = %event.id,
                    kind = %event.kind,
                    fingerprint = %fingerprint,
                    "Skipping duplicate event"
                );
                return MessageOutcome::SkippedDuplicate;
            }
            Ok(false) => {}
            Err(e) => return self.fail(&event, e),
        }

        if !self.circuit_breaker.can_execute() {
            self.statistics.record_circuit_breaker_trip();
            warn!(
                document_id = %event.id,
                kind = %event.kind,
                "Circuit breaker open, deferring event"
            );
            return MessageOutcome::CircuitOpen;
        }

        if let Err(reason) = self.validator.validate(&event) {
            return self
                .skip_invalid(&event, &fingerprint, reason.to_string(), started)
                .await;
        }

        let action = self.router.route(&event);
        if action.is_rate_limited() && !self.rate_limiter.can_proceed() {
            self.statistics.record_rate_limited();
            warn!(
                document_id = %event.id,
                kind = %event.kind,
                current_rate = self.rate_limiter.current_rate(),
                max_rate = self.rate_limiter.max_rate(),
                "Rate limit reached, deferring event"
            );
            return MessageOutcome::RateLimited;
        }

        if let Err(e) = self.loader.execute(action, &event).await {
            if e.is_rejected_request() {
                return self
                    .skip_invalid(&event, &fingerprint, e.to_string(), started)
                    .await;
            }
            return self.fail(&event, e);
        }

        let processing_time_ms = elapsed_ms(started);
        if let Err(e) = self
            .guard
            .mark_processed(&fingerprint, &event.id, event.kind, processing_time_ms)
            .await
        {
            return self.fail(&event, e);
        }

        self.statistics.record_processed(event.kind);
        self.circuit_breaker.record_success();
        debug!(
            document_id = %event.id,
            kind = %event.kind,
            action = %action,
            processing_time_ms = processing_time_ms,
            "Event processed"
        );
        MessageOutcome::Processed
    }

    /// Record an event that can never be applied and move past it.
    ///
    /// Counts as a success for the breaker: the index answered, the data was wrong.
    async fn skip_invalid(
        &self,
        event: &DocumentEvent,
        fingerprint: &str,
        reason: String,
        started: Instant,
    ) -> MessageOutcome {
        self.statistics.record_invalid();
        warn!(
            document_id = %event.id,
            kind = %event.kind,
            reason = %reason,
            "Skipping invalid event"
        );
        if let Err(e) = self
            .guard
            .mark_processed(fingerprint, &event.id, event.kind, elapsed_ms(started))
            .await
        {
            return self.fail(event, e);
        }
        self.circuit_breaker.record_success();
        MessageOutcome::SkippedInvalid
    }

    /// Account for a downstream failure.
    fn fail(&self, event: &DocumentEvent, err: IngestError) -> MessageOutcome {
        self.statistics.record_error();
        self.circuit_breaker.record_failure();
        error!(
            document_id = %event.id,
            kind = %event.kind,
            error = %err,
            consecutive_failures = self.circuit_breaker.consecutive_failures(),
            "Failed to process event"
        );
        MessageOutcome::Failed
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
