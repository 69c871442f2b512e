mod api;
mod app;
mod auth;
mod config;
mod error;
mod feed;
mod model;
mod repo;
mod service;
mod util;

use anyhow::Context;
use std::{net::SocketAddr, path::Path, sync::OnceLock};
use tokio::net::TcpListener;
use tracing_appender::rolling;
use tracing_subscriber::{
    filter::filter_fn, fmt::layer as fmt_layer, prelude::*, EnvFilter, Registry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env().context("failed to load configuration")?;
    setup_tracing(&config)?;
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .context("invalid SERVER_BIND address")?;

    let app = app::build_router(&config)
        .await
        .context("failed to initialise application")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, feed = %config.feed.source_url, "portfolio server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

fn setup_tracing(config: &config::AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config
            .logging
            .level
            .clone()
            .unwrap_or_else(|| "info".to_string());
        EnvFilter::new(level)
    });

    let log_path = Path::new(&config.logging.file);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = log_path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid log file path"))?;
    let directory = log_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| Path::new(".").to_path_buf());

    let file_appender = rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
    let _ = FILE_GUARD.set(guard);

    let crate_filter = filter_fn(|meta| meta.target().starts_with("portfolio"));
    let other_filter = filter_fn(|meta| !meta.target().starts_with("portfolio"));

    let stdout_crate = fmt_layer()
        .with_writer(std::io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_filter(crate_filter.clone());

    let stdout_general = fmt_layer()
        .with_writer(std::io::stdout)
        .with_filter(other_filter.clone());

    let file_layer = fmt_layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(crate_filter);

    Registry::default()
        .with(env_filter)
        .with(stdout_crate)
        .with(stdout_general)
        .with(file_layer)
        .try_init()
        .context("failed to init tracing subscriber")?;

    Ok(())
}
