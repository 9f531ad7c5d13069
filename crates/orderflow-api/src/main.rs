//! Orderflow API server entry point.
//!
//! One process serves HTTP and runs the consumer-group worker. Ctrl-C or
//! SIGTERM cancels both: the server drains in-flight requests, the worker
//! finishes its current message and commits, then the producer is flushed.
//! A worker that stops on an error cancels the same token, so the server
//! drains too and the process exits with that error.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use orderflow_api::config::Config;
use orderflow_api::error::AppError;
use orderflow_api::state::AppState;
use orderflow_cache::RedisOrderCache;
use orderflow_core::clock::{Clock, SystemClock};
use orderflow_core::publisher::OrderPublisher;
use orderflow_queue::{
    ConsumerGroupWorker, ConsumerSettings, KafkaOrderPublisher, OrderIngestor, ProducerSettings,
};
use orderflow_store::PgOrderRepository;

/// How long startup waits for the worker's first partition assignment.
const WORKER_READY_TIMEOUT: Duration = Duration::from_secs(30);
/// How long shutdown waits for queued producer messages.
const PRODUCER_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("starting orderflow API server");

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("database migrations applied");

    let cache = RedisOrderCache::connect(&config.redis_url).await?;
    let producer = KafkaOrderPublisher::new(&ProducerSettings::new(config.kafka_brokers.clone()))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let publisher: Arc<dyn OrderPublisher> = Arc::new(producer.clone());
    let repository = Arc::new(PgOrderRepository::new(pool));

    let ingestor = Arc::new(OrderIngestor::new(
        repository.clone(),
        publisher.clone(),
        config.kafka_dead_letter_topic.clone(),
        clock.clone(),
    ));
    let mut consumer_settings =
        ConsumerSettings::new(config.kafka_brokers.clone(), config.kafka_topic.clone());
    consumer_settings.group_id.clone_from(&config.kafka_group_id);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));
    let worker = ConsumerGroupWorker::new(consumer_settings, ingestor)?.spawn(cancel.clone());

    // A member can legitimately stay unassigned when the group has more
    // members than partitions, so a slow first assignment only warns.
    let ready = tokio::time::timeout(WORKER_READY_TIMEOUT, worker.ready()).await;
    match ready {
        Ok(true) => info!("order worker claimed partitions"),
        Ok(false) => {
            warn!("order worker stopped before claiming partitions");
            worker.join().await?;
            return Ok(());
        }
        Err(_) => warn!(
            timeout_secs = WORKER_READY_TIMEOUT.as_secs(),
            "order worker has no partitions yet, serving anyway"
        ),
    }

    let app_state = AppState::new(
        clock,
        publisher,
        config.kafka_topic.clone(),
        repository,
        Arc::new(cache),
    );

    // TODO: restrict CORS origins once the storefront origin is configurable.
    let app = orderflow_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await;
    cancel.cancel();

    let worker_result = worker.join().await;

    if let Err(e) = producer.flush(PRODUCER_FLUSH_TIMEOUT) {
        error!(error = %e, "producer flush incomplete");
    }

    served?;
    worker_result?;
    info!("shutdown complete");
    Ok(())
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
    cancel.cancel();
}
