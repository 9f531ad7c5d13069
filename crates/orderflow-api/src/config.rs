//! Process configuration read from the environment.

use std::net::SocketAddr;

use orderflow_queue::dead_letter::default_dead_letter_topic;
use orderflow_queue::settings::DEFAULT_GROUP_ID;

use crate::error::AppError;

/// Everything the server needs to connect to its backing services.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Upper bound on pooled database connections.
    pub database_max_connections: u32,
    /// Redis connection string.
    pub redis_url: String,
    /// Comma-separated Kafka bootstrap servers.
    pub kafka_brokers: String,
    /// Topic carrying submitted orders.
    pub kafka_topic: String,
    /// Topic receiving orders the worker could not persist.
    pub kafka_dead_letter_topic: String,
    /// Consumer group of the order worker.
    pub kafka_group_id: String,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        // Blank values count as unset.
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            present(key)
                .ok_or_else(|| AppError::Config(format!("{key} environment variable must be set")))
        };
        let or_default = |key: &str, default: &str| present(key).unwrap_or_else(|| default.to_owned());

        let kafka_topic = required("KAFKA_TOPIC")?;
        let kafka_dead_letter_topic = present("KAFKA_DEAD_LETTER_TOPIC")
            .unwrap_or_else(|| default_dead_letter_topic(&kafka_topic));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: or_default("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .map_err(|e| {
                    AppError::Config(format!("DATABASE_MAX_CONNECTIONS must be a valid u32: {e}"))
                })?,
            redis_url: or_default("REDIS_URL", "redis://127.0.0.1:6379"),
            kafka_brokers: required("KAFKA_BROKERS")?,
            kafka_topic,
            kafka_dead_letter_topic,
            kafka_group_id: or_default("KAFKA_GROUP_ID", DEFAULT_GROUP_ID),
            host: or_default("HOST", "0.0.0.0"),
            port: or_default("PORT", "3000")
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
