//! Kafka implementation of the `OrderPublisher` trait.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tracing::{debug, instrument, warn};

use orderflow_core::error::PublishError;
use orderflow_core::publisher::{OrderPublisher, Placement};

use crate::settings::{PUBLISH_RETRIES, ProducerSettings};

/// Synchronous, quorum-acknowledged publisher over one shared producer
/// client. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct KafkaOrderPublisher {
    producer: FutureProducer,
    queue_timeout: Duration,
}

impl std::fmt::Debug for KafkaOrderPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaOrderPublisher")
            .field("queue_timeout", &self.queue_timeout)
            .finish_non_exhaustive()
    }
}

impl KafkaOrderPublisher {
    /// Creates the producer client. Writes wait for every in-sync replica
    /// (`acks=all`) and transient broker errors are retried by the client.
    ///
    /// # Errors
    ///
    /// Returns `KafkaError` if the client configuration is rejected.
    pub fn new(settings: &ProducerSettings) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .set("acks", "all")
            .set("enable.idempotence", "false")
            .set("retries", PUBLISH_RETRIES.to_string())
            .set(
                "message.timeout.ms",
                settings.message_timeout.as_millis().to_string(),
            )
            .create()?;

        Ok(Self {
            producer,
            queue_timeout: settings.message_timeout,
        })
    }

    /// Waits for every outstanding message to be acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `KafkaError` if messages are still in flight after `timeout`.
    pub fn flush(&self, timeout: Duration) -> Result<(), KafkaError> {
        self.producer.flush(Timeout::After(timeout))
    }
}

#[async_trait]
impl OrderPublisher for KafkaOrderPublisher {
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<Placement, PublishError> {
        let mut record = FutureRecord::<str, [u8]>::to(topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        match self
            .producer
            .send(record, Timeout::After(self.queue_timeout))
            .await
        {
            Ok((partition, offset)) => {
                debug!(partition, offset, "message sent");
                Ok(Placement { partition, offset })
            }
            Err((e, _)) => {
                warn!(error = %e, "publish failed");
                Err(classify(&e))
            }
        }
    }
}

fn classify(err: &KafkaError) -> PublishError {
    match err {
        KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut)
        | KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull) => PublishError::Timeout,
        other => PublishError::Broker(other.to_string()),
    }
}
