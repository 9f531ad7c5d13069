//! Orderflow Core — the order data contract shared by every stage.
//!
//! This crate defines the `Order` aggregate, the JSON codec used identically
//! by producer and consumer, the error taxonomy, and the capability traits
//! that storage, cache and queue adapters implement. It contains no
//! infrastructure code.

pub mod cache;
pub mod clock;
pub mod codec;
pub mod error;
pub mod order;
pub mod publisher;
pub mod repository;
