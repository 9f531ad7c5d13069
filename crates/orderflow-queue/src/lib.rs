//! Orderflow Queue — Kafka plumbing for the write path.
//!
//! The producer appends encoded orders to the orders topic. The
//! consumer-group worker claims partitions, hands every message to the
//! `OrderIngestor`, and stores the offset only once the order is durably
//! persisted or parked on the dead-letter topic.

pub mod dead_letter;
pub mod error;
pub mod ingest;
pub mod producer;
pub mod settings;
pub mod worker;

pub use error::{IngestError, WorkerError};
pub use ingest::{IncomingMessage, OrderIngestor, Outcome};
pub use producer::KafkaOrderPublisher;
pub use settings::{ConsumerSettings, ProducerSettings, RetryPolicy};
pub use worker::{
    ConsumerGroupWorker, OffsetStore, WorkerEvent, WorkerHandle, WorkerState, dispose, next_state,
};
