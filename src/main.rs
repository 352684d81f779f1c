#![forbid(unsafe_code)]

//! `wavecast` — WebSocket record streaming server binary.
//!
//! Loads configuration, binds the listener and serves sessions until
//! Ctrl-C or SIGTERM.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use wavecast::record::{RECORD_LEN, RECORD_TAG};
use wavecast::server;
use wavecast::{AppError, GlobalConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "wavecast", about = "WebSocket sine/cosine record server", version, long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the interface to bind.
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Override the port to bind.
    #[arg(long)]
    port: Option<u16>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("wavecast server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(ref path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    let config = Arc::new(config);
    info!(
        tick_interval_ms = config.producer.tick_interval_ms,
        phase_step = config.producer.phase_step,
        "configuration loaded"
    );

    // ── Bind and serve ──────────────────────────────────
    let listener = server::bind(&config).await?;
    info!(
        addr = %config.listen_addr(),
        record_len = RECORD_LEN,
        tag = RECORD_TAG,
        "websocket server started, sending [tag, u32 LE, u32 LE] every tick"
    );

    let ct = CancellationToken::new();
    let serve_ct = ct.clone();
    let serve_config = Arc::clone(&config);
    let serve_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(listener, serve_config, serve_ct).await {
            error!(%err, "websocket server failed");
        }
    });

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    if let Err(err) = serve_handle.await {
        error!(%err, "server task failed to join");
    }
    info!("wavecast shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
