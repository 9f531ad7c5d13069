//! Dead-letter envelope for orders the worker could not persist.

use chrono::{DateTime, Utc};
use orderflow_core::order::Order;
use serde::{Deserialize, Serialize};

/// Why an order was parked instead of persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadLetterReason {
    /// The order decoded but broke one of its invariants.
    Invalid,
    /// The store permanently rejected the order.
    Rejected,
    /// The store stayed unavailable for every retry attempt.
    RetriesExhausted,
}

/// Message written to the dead-letter topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    /// The order as it was decoded from the source message.
    pub order: Order,
    /// Classification of the failure.
    pub reason: DeadLetterReason,
    /// Last error observed.
    pub error: String,
    /// Persistence attempts made before giving up.
    pub attempts: u32,
    /// Topic the order was consumed from.
    pub source_topic: String,
    /// Partition the order was consumed from.
    pub partition: i32,
    /// Offset of the source message.
    pub offset: i64,
    /// When the order was parked.
    pub failed_at: DateTime<Utc>,
}

/// Dead-letter topic used when none is configured.
#[must_use]
pub fn default_dead_letter_topic(topic: &str) -> String {
    format!("{topic}.dlq")
}
