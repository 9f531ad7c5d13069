//! Consumer-group worker.
//!
//! The worker joins the configured consumer group, claims partitions, and
//! feeds every message through the `OrderIngestor` strictly one at a time.
//! Rebalances are driven by the group protocol inside `recv`, so a
//! revocation can never land in the middle of a message.
//!
//! Offsets are stored explicitly (`enable.auto.offset.store=false`) after a
//! message is disposed of and committed in the background by the client;
//! on shutdown the stored offsets are committed synchronously before the
//! group membership is released.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rdkafka::consumer::{CommitMode, Consumer, ConsumerContext, StreamConsumer};
use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
use rdkafka::{ClientConfig, ClientContext, Message, TopicPartitionList};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::ingest::{IncomingMessage, OrderIngestor, Outcome};
use crate::settings::ConsumerSettings;

/// How often the worker samples its partition assignment while idle.
const ASSIGNMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Lifecycle of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, not yet running.
    Init,
    /// Subscribed, waiting for the group to assign partitions.
    Joining,
    /// Partitions assigned (initially or after a rebalance), no message
    /// processed since.
    Claimed,
    /// Processing messages from the claimed partitions.
    Consuming,
    /// Cancellation observed; committing offsets and leaving the group.
    Cancelling,
    /// Group membership released.
    Closed,
}

/// Something the worker observed that may move it to another state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The topic subscription was registered.
    Subscribed,
    /// A non-empty partition assignment was observed.
    Assigned,
    /// A message was received from a claimed partition.
    MessageReceived,
    /// The worker stopped consuming, on request or after an error.
    Cancelled,
    /// Offsets were committed and the subscription dropped.
    Closed,
}

/// The state a worker in `state` moves to when `event` happens.
///
/// Events that do not apply to the current state leave it unchanged, so a
/// late assignment never revives a worker that is shutting down.
#[must_use]
pub fn next_state(state: WorkerState, event: WorkerEvent) -> WorkerState {
    use WorkerEvent as E;
    use WorkerState as S;

    match (state, event) {
        (S::Init, E::Subscribed) => S::Joining,
        (S::Joining | S::Consuming, E::Assigned) => S::Claimed,
        (S::Claimed, E::MessageReceived) => S::Consuming,
        (S::Closed, E::Cancelled) => S::Closed,
        (_, E::Cancelled) => S::Cancelling,
        (_, E::Closed) => S::Closed,
        (unchanged, _) => unchanged,
    }
}

/// Applies `event` to the published state, notifying watchers only when
/// the state actually changes.
fn transition(state: &watch::Sender<WorkerState>, event: WorkerEvent) -> bool {
    state.send_if_modified(|current| {
        let next = next_state(*current, event);
        let changed = next != *current;
        *current = next;
        changed
    })
}

/// Where the worker records that a message has been disposed of.
pub trait OffsetStore: Send + Sync {
    /// Marks `message` as done so the next commit moves past it.
    ///
    /// # Errors
    ///
    /// Returns the client error if the offset could not be stored.
    fn store(&self, message: &IncomingMessage<'_>) -> KafkaResult<()>;
}

impl<C> OffsetStore for StreamConsumer<C>
where
    C: ConsumerContext + 'static,
{
    fn store(&self, message: &IncomingMessage<'_>) -> KafkaResult<()> {
        // librdkafka commits `offset + 1` for a stored offset.
        self.store_offset(message.topic, message.partition, message.offset)
    }
}

/// Ingests one message and stores its offset once it has been disposed of.
///
/// # Errors
///
/// Returns `WorkerError::Ingest` when the message could be neither persisted
/// nor dead-lettered. Its offset is not stored, so it is redelivered.
pub async fn dispose(
    ingestor: &OrderIngestor,
    message: &IncomingMessage<'_>,
    offsets: &dyn OffsetStore,
) -> Result<Outcome, WorkerError> {
    let outcome = match ingestor.ingest(message).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                error = %e,
                partition = message.partition,
                offset = message.offset,
                "stopping consumer without committing message"
            );
            return Err(e.into());
        }
    };

    if let Err(e) = offsets.store(message) {
        warn!(error = %e, offset = message.offset, "failed to store offset");
    }
    Ok(outcome)
}

/// Cancels `cancel` when the worker stopped on an error, so whatever shares
/// the token shuts down with it.
fn halt_on_error(
    outcome: Result<(), WorkerError>,
    cancel: &CancellationToken,
) -> Result<(), WorkerError> {
    if let Err(e) = &outcome {
        error!(error = %e, "order worker failed, cancelling");
        cancel.cancel();
    }
    outcome
}

/// Partitions owned by this member, as last observed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Assignment {
    partitions: BTreeSet<(String, i32)>,
}

/// Difference between two observed assignments.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssignmentChange {
    /// Newly claimed partitions.
    pub assigned: Vec<(String, i32)>,
    /// Partitions handed to another member.
    pub revoked: Vec<(String, i32)>,
}

impl AssignmentChange {
    /// Whether the assignment changed at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty() && self.revoked.is_empty()
    }
}

impl Assignment {
    /// Replaces the assignment and reports what changed.
    pub fn update(&mut self, current: impl IntoIterator<Item = (String, i32)>) -> AssignmentChange {
        let current: BTreeSet<(String, i32)> = current.into_iter().collect();
        let change = AssignmentChange {
            assigned: current.difference(&self.partitions).cloned().collect(),
            revoked: self.partitions.difference(&current).cloned().collect(),
        };
        self.partitions = current;
        change
    }

    /// Whether no partitions are owned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Logs offset commit failures reported by the client.
#[derive(Debug, Default)]
struct IngestContext;

impl ClientContext for IngestContext {}

impl ConsumerContext for IngestContext {
    fn commit_callback(&self, result: KafkaResult<()>, offsets: &TopicPartitionList) {
        match result {
            Ok(()) => debug!(partitions = offsets.count(), "offsets committed"),
            Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => {}
            Err(e) => warn!(error = %e, "offset commit failed"),
        }
    }
}

/// Consumer-group member that ingests orders until cancelled.
pub struct ConsumerGroupWorker {
    consumer: StreamConsumer<IngestContext>,
    settings: ConsumerSettings,
    ingestor: Arc<OrderIngestor>,
}

impl std::fmt::Debug for ConsumerGroupWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerGroupWorker")
            .field("settings", &self.settings)
            .field("ingestor", &self.ingestor)
            .finish_non_exhaustive()
    }
}

impl ConsumerGroupWorker {
    /// Creates the group consumer. A brand-new group starts from the oldest
    /// retained message; an existing group resumes from its committed
    /// offsets.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Kafka` if the client configuration is rejected.
    pub fn new(settings: ConsumerSettings, ingestor: Arc<OrderIngestor>) -> Result<Self, WorkerError> {
        let consumer: StreamConsumer<IngestContext> = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .set("group.id", &settings.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .set(
                "session.timeout.ms",
                settings.session_timeout.as_millis().to_string(),
            )
            .create_with_context(IngestContext)?;

        Ok(Self {
            consumer,
            settings,
            ingestor,
        })
    }

    /// Runs the worker on its own task until `cancel` fires or a message
    /// cannot be disposed of safely. In the latter case the worker cancels
    /// `cancel` itself before it exits.
    #[must_use]
    pub fn spawn(self, cancel: CancellationToken) -> WorkerHandle {
        let (state_tx, state_rx) = watch::channel(WorkerState::Init);
        let task = tokio::spawn(self.run(cancel, state_tx));
        WorkerHandle::new(state_rx, task)
    }

    async fn run(
        self,
        cancel: CancellationToken,
        state: watch::Sender<WorkerState>,
    ) -> Result<(), WorkerError> {
        if let Err(e) = self.consumer.subscribe(&[self.settings.topic.as_str()]) {
            return halt_on_error(Err(e.into()), &cancel);
        }
        transition(&state, WorkerEvent::Subscribed);
        info!(
            topic = %self.settings.topic,
            group_id = %self.settings.group_id,
            "joined consumer group"
        );

        let outcome = self.consume(&cancel, &state).await;

        transition(&state, WorkerEvent::Cancelled);
        self.close();
        transition(&state, WorkerEvent::Closed);
        info!("consumer closed");
        halt_on_error(outcome, &cancel)
    }

    async fn consume(
        &self,
        cancel: &CancellationToken,
        state: &watch::Sender<WorkerState>,
    ) -> Result<(), WorkerError> {
        let mut assignment = Assignment::default();
        let mut poll = tokio::time::interval(ASSIGNMENT_POLL_INTERVAL);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    info!("terminating: cancellation requested");
                    return Ok(());
                }

                _ = poll.tick() => {
                    self.observe_assignment(&mut assignment, state);
                }

                received = self.consumer.recv() => {
                    let message = match received {
                        Ok(message) => message,
                        Err(e) => {
                            warn!(error = %e, "error from consumer");
                            continue;
                        }
                    };

                    self.observe_assignment(&mut assignment, state);
                    transition(state, WorkerEvent::MessageReceived);

                    debug!(
                        topic = message.topic(),
                        partition = message.partition(),
                        offset = message.offset(),
                        "message claimed"
                    );
                    let incoming = IncomingMessage {
                        topic: message.topic(),
                        partition: message.partition(),
                        offset: message.offset(),
                        payload: message.payload(),
                    };

                    dispose(&self.ingestor, &incoming, &self.consumer).await?;
                }
            }
        }
    }

    fn observe_assignment(&self, assignment: &mut Assignment, state: &watch::Sender<WorkerState>) {
        let current = match self.consumer.assignment() {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "failed to read partition assignment");
                return;
            }
        };
        let change = assignment.update(
            current
                .elements()
                .iter()
                .map(|elem| (elem.topic().to_owned(), elem.partition())),
        );
        if change.is_empty() {
            return;
        }

        if !change.revoked.is_empty() {
            info!(partitions = ?change.revoked, "partitions revoked");
        }
        if !change.assigned.is_empty() {
            info!(partitions = ?change.assigned, "partitions assigned");
        }
        if !assignment.is_empty() {
            transition(state, WorkerEvent::Assigned);
        }
    }

    fn close(&self) {
        match self.consumer.commit_consumer_state(CommitMode::Sync) {
            Ok(()) | Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => {}
            Err(e) => error!(error = %e, "failed to commit offsets on shutdown"),
        }
        self.consumer.unsubscribe();
    }
}

/// Handle to a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    state: watch::Receiver<WorkerState>,
    task: JoinHandle<Result<(), WorkerError>>,
}

impl WorkerHandle {
    fn new(state: watch::Receiver<WorkerState>, task: JoinHandle<Result<(), WorkerError>>) -> Self {
        Self { state, task }
    }

    /// The worker's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Resolves once the initial partition assignment has completed.
    ///
    /// Returns `false` if the worker shut down before it was ever assigned
    /// partitions.
    pub async fn ready(&self) -> bool {
        let mut state = self.state.clone();
        state
            .wait_for(|s| !matches!(s, WorkerState::Init | WorkerState::Joining))
            .await
            .is_ok_and(|s| matches!(*s, WorkerState::Claimed | WorkerState::Consuming))
    }

    /// Waits for the worker task to finish.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the worker, or `WorkerError::Panicked`
    /// if the task did not complete normally.
    pub async fn join(self) -> Result<(), WorkerError> {
        self.task
            .await
            .map_err(|e| WorkerError::Panicked(e.to_string()))?
    }
}
