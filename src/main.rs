//! Roomie Server
//!
//! Entry point that loads configuration, starts the real-time engine and the
//! HTTP API, and coordinates graceful shutdown.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use roomie_core::config::AppConfig;
use roomie_core::error::{AppError, ErrorKind};
use roomie_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    match std::env::var("ROOMIE_CONFIG") {
        Ok(path) => AppConfig::from_file(&path),
        Err(_) => {
            let env = std::env::var("ROOMIE_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Roomie v{}", env!("CARGO_PKG_VERSION"));

    let realtime = Arc::new(RealtimeEngine::new(config.realtime.clone()));
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let addr = config.server.bind_address();
    let app_state = roomie_api::AppState::with_engine(config, Arc::clone(&realtime));
    let app = roomie_api::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;

    tracing::info!("Roomie server listening on {}", addr);

    let (stopped_tx, mut stopped_rx) = watch::channel(false);
    let engine = Arc::clone(&realtime);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        if let Err(e) = engine.shutdown().await {
            tracing::warn!(error = %e, "Real-time engine shutdown failed");
        }
        let _ = stopped_tx.send(true);
    });

    let forced = async {
        if stopped_rx.wait_for(|stopped| *stopped).await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;
        }
        _ = forced => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Grace period elapsed, exiting");
        }
    }

    tracing::info!("Roomie server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
