//! Shared test doubles and fixtures for the orderflow pipeline.

mod cache;
mod clock;
mod fixtures;
mod publisher;
mod repository;

pub use cache::{FailingOrderCache, InMemoryOrderCache};
pub use clock::{FixedClock, ManualClock};
pub use fixtures::{fixed_now, sample_item, sample_order};
pub use publisher::{FailingPublisher, PublishedMessage, RecordingPublisher};
pub use repository::{FailingOrderRepository, InMemoryOrderRepository};
