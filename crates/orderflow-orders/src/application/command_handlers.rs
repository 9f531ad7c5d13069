//! Command handlers for the order context.
//!
//! Submitting an order never touches the store: the order is built,
//! validated, encoded, and appended to the orders topic. The worker
//! materializes it later.

use orderflow_core::clock::Clock;
use orderflow_core::codec;
use orderflow_core::error::DomainError;
use orderflow_core::publisher::{OrderPublisher, Placement};
use tracing::{info, instrument};

use crate::domain::commands::SubmitOrder;
use crate::domain::factory::build_order;

/// Identifiers handed back to the customer once the broker acknowledged the
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedOrder {
    /// The generated order identifier.
    pub order_uid: String,
    /// The generated tracking number.
    pub track_number: String,
    /// Where the broker placed the message.
    pub placement: Placement,
}

/// Handles the `SubmitOrder` command: builds and validates the order, then
/// publishes it keyed by `order_uid` so every message for one order lands
/// on the same partition.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the submission breaks an order
/// invariant, `DomainError::Codec` if it cannot be encoded, and
/// `DomainError::Publish` if the broker does not acknowledge it.
#[instrument(
    skip(command, clock, publisher),
    fields(correlation_id = %command.correlation_id, customer_id = %command.customer_id)
)]
pub async fn handle_submit_order(
    command: &SubmitOrder,
    clock: &dyn Clock,
    publisher: &dyn OrderPublisher,
    topic: &str,
) -> Result<SubmittedOrder, DomainError> {
    let order = build_order(command, clock);
    order.validate()?;

    let payload = codec::encode(&order)?;
    let placement = publisher
        .publish(topic, Some(&order.order_uid), &payload)
        .await?;

    info!(
        order_uid = %order.order_uid,
        partition = placement.partition,
        offset = placement.offset,
        "order sent to queue"
    );

    Ok(SubmittedOrder {
        order_uid: order.order_uid,
        track_number: order.track_number,
        placement,
    })
}

#[cfg(test)]
mod tests {
    use orderflow_core::codec;
    use orderflow_core::error::{DomainError, PublishError};
    use orderflow_test_support::{FailingPublisher, FixedClock, RecordingPublisher, fixed_now};

    use crate::application::command_handlers::handle_submit_order;
    use crate::domain::factory::tests::submit_command;

    #[tokio::test]
    async fn test_handle_submit_order_publishes_encoded_order_keyed_by_uid() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let publisher = RecordingPublisher::new();
        let command = submit_command("42");

        // Act
        let submitted = handle_submit_order(&command, &clock, &publisher, "orders")
            .await
            .unwrap();

        // Assert
        let published = publisher.published_to("orders");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].key.as_deref(), Some(submitted.order_uid.as_str()));

        let order = codec::decode(&published[0].payload).unwrap();
        assert_eq!(order.order_uid, submitted.order_uid);
        assert_eq!(order.track_number, submitted.track_number);
        assert_eq!(order.customer_id, "42");
        assert_eq!(order.items.len(), 2);
        assert_eq!(submitted.placement.partition, 0);
    }

    #[tokio::test]
    async fn test_handle_submit_order_rejects_empty_items_without_publishing() {
        // Arrange
        let publisher = RecordingPublisher::new();
        let mut command = submit_command("42");
        command.items.clear();

        // Act
        let result =
            handle_submit_order(&command, &FixedClock(fixed_now()), &publisher, "orders").await;

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_handle_submit_order_rejects_out_of_range_sale() {
        let publisher = RecordingPublisher::new();
        let mut command = submit_command("42");
        command.items[0].sale = 101;

        let result =
            handle_submit_order(&command, &FixedClock(fixed_now()), &publisher, "orders").await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_handle_submit_order_rejects_missing_customer() {
        let publisher = RecordingPublisher::new();
        let command = submit_command("  ");

        let result =
            handle_submit_order(&command, &FixedClock(fixed_now()), &publisher, "orders").await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_handle_submit_order_surfaces_broker_failure() {
        // Arrange
        let command = submit_command("42");

        // Act
        let result =
            handle_submit_order(&command, &FixedClock(fixed_now()), &FailingPublisher, "orders")
                .await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::Publish(PublishError::Broker(_)))
        ));
    }
}
