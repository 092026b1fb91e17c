// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alpha_gateway::audit::TracingAuditSink;
use alpha_gateway::clock::SystemClock;
use alpha_gateway::store::{MemoryStore, SeedData};
use alpha_gateway::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = config.port,
        issuer = %config.jwt_issuer,
        token_ttl_minutes = config.agent_token_ttl_minutes,
        cache_ttl_secs = config.classification_cache_ttl_secs,
        "starting alpha-gateway"
    );

    if config.uses_default_secret() {
        tracing::warn!("JWT_SECRET is the built-in default; agent credentials are forgeable");
    }

    // Create store and seed it
    let store = Arc::new(MemoryStore::with_visit_capacity(config.visit_retention));
    if let Some(path) = &config.seed_path {
        SeedData::from_file(path)?.apply(&store).await?;
    }

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let state = AppState::new(
        &config,
        store,
        Arc::new(SystemClock),
        Arc::new(TracingAuditSink),
    );
    let shutting_down = Arc::clone(&state.shutting_down);

    // Spawn cache purge task
    let classifier = Arc::clone(&state.classifier);
    let mut purge_shutdown_rx = shutdown_tx.subscribe();
    let purge_every = Duration::from_secs(config.classification_cache_ttl_secs.max(1) as u64);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let purged = classifier.cache().purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "expired classifications purged");
                    }
                }
                _ = purge_shutdown_rx.recv() => {
                    tracing::debug!("cache purge task shutting down");
                    break;
                }
            }
        }
    });

    // Build application router
    let app = build_router(state);

    // Create TCP listener
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "listening for connections");

    // Spawn graceful shutdown handler
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, initiating graceful shutdown");

        // Mark as shutting down (health check will return not ready)
        shutting_down.store(true, Ordering::SeqCst);

        // Signal all tasks to stop
        let _ = shutdown_tx_clone.send(());
    });

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let mut rx = shutdown_tx.subscribe();
            let _ = rx.recv().await;
        })
        .await?;

    tracing::info!("alpha-gateway stopped");
    Ok(())
}

/// Initialize tracing based on configuration.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
