//! Orderflow — order submission and lookup use cases.
//!
//! The write path builds an order from a customer's submission and appends
//! it to the queue; nothing is stored synchronously. The read path serves
//! orders cache-aside from the store.

pub mod application;
pub mod domain;
