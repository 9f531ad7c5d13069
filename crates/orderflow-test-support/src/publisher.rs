//! Test publishers — mock `OrderPublisher` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use orderflow_core::error::PublishError;
use orderflow_core::publisher::{OrderPublisher, Placement};

/// One message captured by `RecordingPublisher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Destination topic.
    pub topic: String,
    /// Partition key, if any.
    pub key: Option<String>,
    /// Raw payload.
    pub payload: Vec<u8>,
}

/// A publisher that acknowledges every message on partition 0 with
/// increasing offsets and records what it was given.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PublishedMessage>>,
}

impl RecordingPublisher {
    /// Create an empty recording publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every published message, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Messages published to `topic`.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|m| m.topic == topic)
            .collect()
    }
}

#[async_trait]
impl OrderPublisher for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<Placement, PublishError> {
        let mut published = self.published.lock().unwrap();
        published.push(PublishedMessage {
            topic: topic.to_owned(),
            key: key.map(str::to_owned),
            payload: payload.to_vec(),
        });
        let offset = i64::try_from(published.len() - 1).unwrap_or(i64::MAX);
        Ok(Placement {
            partition: 0,
            offset,
        })
    }
}

/// A publisher whose broker is always unreachable.
#[derive(Debug)]
pub struct FailingPublisher;

#[async_trait]
impl OrderPublisher for FailingPublisher {
    async fn publish(
        &self,
        _topic: &str,
        _key: Option<&str>,
        _payload: &[u8],
    ) -> Result<Placement, PublishError> {
        Err(PublishError::Broker("all brokers down".into()))
    }
}
