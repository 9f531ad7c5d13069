//! Queue-side error types.

use orderflow_core::error::{CodecError, PublishError};
use rdkafka::error::KafkaError;
use thiserror::Error;

/// A message could neither be persisted nor parked, so its offset must not
/// be stored.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The dead-letter envelope could not be serialized.
    #[error("failed to encode dead letter: {0}")]
    Encode(#[from] CodecError),

    /// The dead-letter topic did not acknowledge the message.
    #[error("dead-letter publish failed for partition {partition} offset {offset}: {source}")]
    DeadLetterUnavailable {
        /// Partition of the message that could not be parked.
        partition: i32,
        /// Offset of the message that could not be parked.
        offset: i64,
        /// Underlying publish failure.
        #[source]
        source: PublishError,
    },
}

/// Reasons the consumer-group worker stopped other than cancellation.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The Kafka client failed to start, subscribe or close.
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),

    /// A message could not be safely disposed of; consumption stopped
    /// before its offset was stored.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// The worker task panicked or was aborted.
    #[error("worker task failed: {0}")]
    Panicked(String),
}
