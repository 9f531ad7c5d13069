//! Orderflow Cache — Redis front for single-order lookups.
//!
//! Entries live under `order-<order_uid>` as JSON and expire after one hour.
//! The cache is never authoritative; see `orderflow_core::cache`.

pub mod redis_order_cache;

pub use redis_order_cache::RedisOrderCache;
