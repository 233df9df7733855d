use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hellosvc_api::config::ServerConfig;
use hellosvc_api::engine::JobDispatcher;
use hellosvc_api::router::build_app_router;
use hellosvc_api::state::AppState;
use hellosvc_broker::{BrokerConfig, BrokerConnection};
use hellosvc_db::PgStore;
use hellosvc_worker::shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hellosvc_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

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

    hellosvc_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let store = Arc::new(PgStore::new(pool.clone()));

    // --- Broker ---
    let connection = BrokerConnection::connect(BrokerConfig::from_env())
        .await
        .context("Failed to connect to AMQP broker")?;
    let publisher = connection
        .publisher()
        .await
        .context("Failed to open publisher channel")?;

    // --- App state ---
    let dispatcher = JobDispatcher::new(
        store.clone(),
        Arc::new(publisher),
        connection.config().confirm_timeout,
    );
    let state = AppState {
        jobs: store.clone(),
        users: store,
        dispatcher: Arc::new(dispatcher),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config.host.parse().context("Invalid HOST address")?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = drain_tx.send(());
    });

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let mut server = tokio::spawn(async move { server.await });

    // In-flight requests get `shutdown_timeout` to finish once a signal arrives.
    tokio::select! {
        result = &mut server => {
            result.context("Server task panicked")?.context("Server error")?;
        }
        _ = drain_rx => {
            match tokio::time::timeout(shutdown_timeout, &mut server).await {
                Ok(result) => result.context("Server task panicked")?.context("Server error")?,
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = shutdown_timeout.as_secs(),
                        "Requests still in flight after shutdown timeout, closing anyway",
                    );
                    server.abort();
                }
            }
        }
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if let Err(e) = connection.close().await {
        tracing::warn!(error = %e, "Failed to close AMQP connection cleanly");
    }
    pool.close().await;
    tracing::info!("Database pool closed");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}
