//! Orderflow Store — PostgreSQL persistence for the order aggregate.
//!
//! An order spans four tables (`deliveries`, `payments`, `orders`, `items`);
//! the schema lives in the workspace `migrations/` directory.

pub mod pg_order_repository;

pub use pg_order_repository::PgOrderRepository;
