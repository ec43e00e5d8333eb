use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod config;
mod tuner;

use config::{LogFormat, WorkerConfig};
use tuner::Tuner;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = WorkerConfig::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {e}"));

    // --- Tracing ---
    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handpicked_worker=debug,handpicked_db=info".into()),
        )
        .with(fmt_layer)
        .init();

    tracing::info!(
        tick_interval_secs = config.tick_interval.as_secs(),
        preload_window_secs = config.preload_window_secs,
        db_max_connections = config.db_max_connections,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = handpicked_db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    handpicked_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    if config.run_migrations {
        handpicked_db::run_migrations(&pool)
            .await
            .expect("Failed to run database migrations");
        tracing::info!("Database migrations applied");
    }

    match handpicked_db::repositories::HighlightRepo::audit(&pool).await {
        Ok(Ok(())) => tracing::debug!("Highlight order audit passed"),
        Ok(Err(_)) => {}
        Err(e) => tracing::warn!(error = %e, "Highlight order audit could not run"),
    }

    // --- Tuner ---
    let cancel = CancellationToken::new();
    let tuner = Tuner::new(pool.clone(), config.preload_window_secs);
    let tuner_handle = tokio::spawn(tuner.run(config.tick_interval, cancel.clone()));

    shutdown_signal().await;

    // --- Shutdown ---
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), tuner_handle).await;

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
