//! chat-relay binary: one relay instance.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_relay::adapters::{app_router, RedisBroker, RelayContext};
use chat_relay::application::PresenceError;
use chat_relay::config::AppConfig;
use chat_relay::ports::BrokerError;

/// Startup failures; each one ends the process with exit code 1.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("Failed to connect to broker: {0}")]
    Broker(#[from] BrokerError),

    #[error("Failed to initialize connection count: {0}")]
    CountInit(#[from] PresenceError),

    #[error("Failed to bind {host}:{port}: {source}")]
    Bind {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let broker = Arc::new(RedisBroker::connect(&config.redis).await?);
    tracing::info!("Connected to broker");

    let context = RelayContext::with_broker(broker, config.server.port).await?;

    let app = app_router(context.clone(), &config.server.cors_origins_list());

    let (host, port) = config.server.bind_addr();
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|source| StartupError::Bind {
            host: host.to_string(),
            port,
            source,
        })?;
    match listener.local_addr() {
        Ok(addr) => tracing::info!(%addr, "Chat relay listening"),
        Err(_) => tracing::info!(host, port, "Chat relay listening"),
    }

    let grace = config.server.shutdown_grace();
    let draining = Arc::new(Notify::new());
    let shutdown = {
        let draining = draining.clone();
        async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, reconciling connection count");
            context.shutdown(grace).await;
            draining.notify_one();
        }
    };

    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    };

    // Connections get one more grace period to finish once draining starts.
    tokio::select! {
        served = server => served.map_err(StartupError::Serve)?,
        _ = async {
            draining.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("Connections still open after the grace period, exiting anyway");
        }
    }

    tracing::info!("Chat relay stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
