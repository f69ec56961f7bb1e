//! # Pont Entry Point
//!
//! The main executable of the bridge. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and resolves the
//!    configuration.
//! 2. **Logging**: Installs a `tracing` subscriber filtered by `RUST_LOG` (or the configured level).
//! 3. **Upstream**: Builds the lazily connected channel to the gRPC backend.
//! 4. **Serving**: Accepts gRPC-Web requests over HTTP/1.1 until Ctrl-C.

mod cli;

use anyhow::Context;
use axum::{Router, http::StatusCode};
use clap::Parser;
use cli::Cli;
use pont_core::{CallExecutor, GrpcWebProxy, MethodRouter, ProxyConfig};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Err(err) = run(config).await {
        tracing::error!("{err:#}");
        process::exit(1);
    }
}

async fn run(config: ProxyConfig) -> anyhow::Result<()> {
    let executor = CallExecutor::connect_lazy(&config.upstream)?;
    let proxy = GrpcWebProxy::new(MethodRouter::new(&config.service), executor);

    // Anything outside the service namespace is not ours to answer.
    let app = proxy.wrap(Router::new().fallback(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    tracing::info!(
        "Bridging gRPC-Web on http://{} to {} for /{}/*",
        listener.local_addr()?,
        config.upstream.url,
        config.service
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a signal handler, keep serving until the process is killed.
        tracing::error!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
