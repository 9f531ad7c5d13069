//! Error taxonomy for the ingestion pipeline.
//!
//! Each stage has its own error type so callers can decide locally whether a
//! failure is absorbed (codec, cache) or surfaced (publish, persist).
//! `DomainError` is what the application layer returns.

use thiserror::Error;

/// A payload could not be turned into bytes or back into an `Order`.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serializing an order failed.
    #[error("failed to encode order: {0}")]
    Encode(#[source] serde_json::Error),

    /// The payload is not a well-formed order.
    #[error("failed to decode order: {0}")]
    Decode(#[source] serde_json::Error),
}

/// The broker did not acknowledge a publish.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker rejected the write or is unreachable after the client's
    /// retries were exhausted.
    #[error("broker rejected publish: {0}")]
    Broker(String),

    /// No acknowledgement arrived before the delivery timeout.
    #[error("publish timed out waiting for broker acknowledgement")]
    Timeout,
}

impl PublishError {
    /// Whether repeating the publish could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// The durable store refused or failed a transaction.
#[derive(Debug, Error)]
pub enum PersistError {
    /// An order with the same `order_uid` already exists.
    #[error("order {0} already exists")]
    Duplicate(String),

    /// The store rejected the data (constraint violation or similar).
    #[error("store rejected order: {0}")]
    Rejected(String),

    /// The store could not be reached or the transaction was interrupted.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl PersistError {
    /// Whether retrying the same transaction could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// The cache could not serve or store an entry. Never fatal to a read.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache backend failed the round trip.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A cached value could not be decoded.
    #[error("cached value is corrupt: {0}")]
    Corrupt(String),
}

/// Top-level error returned by the application layer.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The order does not exist or is not owned by the caller.
    #[error("order not found: {0}")]
    NotFound(String),

    /// The order breaks one of its invariants.
    #[error("validation error: {0}")]
    Validation(String),

    /// Encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The order could not be handed to the queue.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// The store failed.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The cache failed in a way the caller chose to surface.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_persist_errors_are_transient() {
        assert!(PersistError::Unavailable("pool timed out".into()).is_transient());
        assert!(!PersistError::Duplicate("u1".into()).is_transient());
        assert!(!PersistError::Rejected("check violation".into()).is_transient());
    }

    #[test]
    fn test_publish_timeout_is_transient() {
        assert!(PublishError::Timeout.is_transient());
        assert!(!PublishError::Broker("unknown topic".into()).is_transient());
    }

    #[test]
    fn test_domain_error_is_transparent_over_stage_errors() {
        let err = DomainError::from(PersistError::Duplicate("u1".into()));
        assert_eq!(err.to_string(), "order u1 already exists");
    }
}
