//! Queue publishing capability.

use async_trait::async_trait;

use crate::error::PublishError;

/// Where the broker placed an acknowledged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Partition the message was appended to.
    pub partition: i32,
    /// Offset of the message within the partition.
    pub offset: i64,
}

/// Durable, synchronous publish to a topic.
///
/// Implementations are stateless with respect to the caller and safe to
/// share between concurrent requests.
#[async_trait]
pub trait OrderPublisher: Send + Sync {
    /// Appends `payload` to `topic` and waits for the broker to acknowledge
    /// it. Messages with the same `key` land on the same partition.
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<Placement, PublishError>;
}
