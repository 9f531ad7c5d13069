//! Per-message ingestion: decode, validate, persist, or park.
//!
//! `OrderIngestor` holds everything the worker does with one message and
//! knows nothing about Kafka, so the offset-commit contract can be tested
//! with in-memory doubles:
//!
//! * `Ok(_)` means the offset may be stored.
//! * `Err(_)` means the message was neither persisted nor parked and the
//!   worker must stop before storing its offset.

use std::sync::Arc;

use orderflow_core::clock::Clock;
use orderflow_core::codec;
use orderflow_core::error::{CodecError, PersistError};
use orderflow_core::order::Order;
use orderflow_core::publisher::OrderPublisher;
use orderflow_core::repository::OrderRepository;
use tracing::{error, info, instrument, warn};

use crate::dead_letter::{DeadLetter, DeadLetterReason};
use crate::error::IngestError;
use crate::settings::RetryPolicy;

/// Broker-independent view of one consumed message.
#[derive(Debug, Clone, Copy)]
pub struct IncomingMessage<'a> {
    /// Source topic.
    pub topic: &'a str,
    /// Source partition.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
    /// Raw payload; Kafka allows null values.
    pub payload: Option<&'a [u8]>,
}

/// How a message was disposed of. Every variant allows the offset to be
/// stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The order was written to the store.
    Persisted {
        /// The persisted order.
        order_uid: String,
        /// Attempts it took.
        attempts: u32,
    },
    /// The order was already in the store (a redelivery).
    AlreadyPersisted {
        /// The redelivered order.
        order_uid: String,
    },
    /// The payload was empty or not an order; skipped without dead-lettering.
    Skipped,
    /// The order was parked on the dead-letter topic.
    DeadLettered {
        /// The parked order.
        order_uid: String,
        /// Why it was parked.
        reason: DeadLetterReason,
    },
}

/// Decodes, validates and persists orders consumed from the queue.
pub struct OrderIngestor {
    repository: Arc<dyn OrderRepository>,
    dead_letters: Arc<dyn OrderPublisher>,
    dead_letter_topic: String,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for OrderIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderIngestor")
            .field("dead_letter_topic", &self.dead_letter_topic)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl OrderIngestor {
    /// Creates an ingestor writing to `repository` and parking failures on
    /// `dead_letter_topic` through `dead_letters`.
    #[must_use]
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        dead_letters: Arc<dyn OrderPublisher>,
        dead_letter_topic: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            dead_letters,
            dead_letter_topic: dead_letter_topic.into(),
            retry: RetryPolicy::default(),
            clock,
        }
    }

    /// Replaces the persistence retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Processes one message to completion.
    ///
    /// Transient store failures are retried per the `RetryPolicy`; the call
    /// does not observe cancellation, so an in-flight write always finishes.
    ///
    /// # Errors
    ///
    /// Returns `IngestError` when the order could not be persisted and could
    /// not be parked either. The caller must not store the offset.
    #[instrument(
        skip(self, message),
        fields(topic = message.topic, partition = message.partition, offset = message.offset)
    )]
    pub async fn ingest(&self, message: &IncomingMessage<'_>) -> Result<Outcome, IngestError> {
        let Some(payload) = message.payload else {
            warn!("message has no payload, skipping");
            return Ok(Outcome::Skipped);
        };

        let order = match codec::decode(payload) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "failed to decode order, skipping");
                return Ok(Outcome::Skipped);
            }
        };

        if let Err(e) = order.validate() {
            warn!(order_uid = %order.order_uid, error = %e, "order failed validation");
            return self
                .dead_letter(message, order, DeadLetterReason::Invalid, e.to_string(), 0)
                .await;
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.repository.create(&order).await {
                Ok(()) => {
                    info!(order_uid = %order.order_uid, attempts, "order created successfully");
                    return Ok(Outcome::Persisted {
                        order_uid: order.order_uid,
                        attempts,
                    });
                }
                Err(PersistError::Duplicate(order_uid)) => {
                    info!(%order_uid, "order already persisted, acknowledging redelivery");
                    return Ok(Outcome::AlreadyPersisted { order_uid });
                }
                Err(e) if e.is_transient() && attempts < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempts);
                    warn!(
                        order_uid = %order.order_uid,
                        attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "failed to create order, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    let reason = if e.is_transient() {
                        DeadLetterReason::RetriesExhausted
                    } else {
                        DeadLetterReason::Rejected
                    };
                    error!(order_uid = %order.order_uid, attempts, error = %e, "failed to create order");
                    return self
                        .dead_letter(message, order, reason, e.to_string(), attempts)
                        .await;
                }
            }
        }
    }

    async fn dead_letter(
        &self,
        message: &IncomingMessage<'_>,
        order: Order,
        reason: DeadLetterReason,
        error: String,
        attempts: u32,
    ) -> Result<Outcome, IngestError> {
        let order_uid = order.order_uid.clone();
        let letter = DeadLetter {
            order,
            reason,
            error,
            attempts,
            source_topic: message.topic.to_owned(),
            partition: message.partition,
            offset: message.offset,
            failed_at: self.clock.now(),
        };
        let payload = serde_json::to_vec(&letter).map_err(CodecError::Encode)?;

        self.dead_letters
            .publish(&self.dead_letter_topic, Some(&order_uid), &payload)
            .await
            .map_err(|source| {
                error!(%order_uid, error = %source, "failed to park order on dead-letter topic");
                IngestError::DeadLetterUnavailable {
                    partition: message.partition,
                    offset: message.offset,
                    source,
                }
            })?;

        warn!(%order_uid, ?reason, topic = %self.dead_letter_topic, "order parked on dead-letter topic");
        Ok(Outcome::DeadLettered { order_uid, reason })
    }
}
