//! Domain layer: commands accepted from callers and order construction.

pub mod commands;
pub mod factory;
