//! Connection and retry settings for the queue clients.

use std::time::Duration;

/// Consumer group shared by every worker instance of the service.
pub const DEFAULT_GROUP_ID: &str = "orders-group";

/// Number of times the producer client retries a transient broker error
/// before the publish fails.
pub const PUBLISH_RETRIES: u32 = 5;

/// Settings for `KafkaOrderPublisher`.
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    /// Comma-separated bootstrap servers.
    pub brokers: String,
    /// Upper bound on how long one publish may wait for acknowledgement,
    /// retries included.
    pub message_timeout: Duration,
}

impl ProducerSettings {
    /// Settings with a 30 second delivery timeout.
    #[must_use]
    pub fn new(brokers: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            message_timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for `ConsumerGroupWorker`.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Comma-separated bootstrap servers.
    pub brokers: String,
    /// Consumer group to join.
    pub group_id: String,
    /// Topic carrying encoded orders.
    pub topic: String,
    /// Group session timeout.
    pub session_timeout: Duration,
}

impl ConsumerSettings {
    /// Settings joining `DEFAULT_GROUP_ID` on `topic`.
    #[must_use]
    pub fn new(brokers: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            group_id: DEFAULT_GROUP_ID.to_owned(),
            topic: topic.into(),
            session_timeout: Duration::from_secs(10),
        }
    }
}

/// Bounded retry of transient persistence failures inside the worker.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}
