use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hellosvc_broker::{BrokerConfig, BrokerConnection};
use hellosvc_db::{JobStore, PgStore};
use hellosvc_worker::shutdown::shutdown_signal;
use hellosvc_worker::Worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hellosvc_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let options =
        hellosvc_db::connect_options_from_env().context("Invalid database configuration")?;
    let pool = hellosvc_db::create_pool(options)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    hellosvc_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    let store: Arc<dyn JobStore> = Arc::new(PgStore::new(pool.clone()));

    // --- Broker ---
    let broker_config = BrokerConfig::from_env();
    let connection = BrokerConnection::connect(broker_config)
        .await
        .context("Failed to connect to AMQP broker")?;
    let consumer = connection
        .consumer()
        .await
        .context("Failed to open consumer channel")?;

    // --- Shutdown ---
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    // --- Consume ---
    let summary = Worker::new(consumer, store).run(cancel).await;

    // --- Cleanup ---
    if let Err(e) = connection.close().await {
        tracing::warn!(error = %e, "Failed to close AMQP connection cleanly");
    }
    pool.close().await;

    tracing::info!(
        acked = summary.acked,
        nacked = summary.nacked,
        unsettled = summary.unsettled,
        "Worker shutdown complete",
    );
    Ok(())
}
