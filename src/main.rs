#![forbid(unsafe_code)]

//! `mcp-relay-agent`: dials the relay and serves the built-in tools over
//! the resulting connection until shut down.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use mcp_relay_agent::config::{BridgeConfig, ConfigOverrides};
use mcp_relay_agent::mcp::dispatcher::Dispatcher;
use mcp_relay_agent::mcp::engine::Engine;
use mcp_relay_agent::mcp::tools;
use mcp_relay_agent::transport::{connector, keepalive};
use mcp_relay_agent::{lifecycle, AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "mcp-relay-agent", about = "Serve MCP tools through a relay", version, long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Relay address as host:port.
    #[arg(long)]
    relay: Option<String>,

    /// Server identity announced to the relay.
    #[arg(long)]
    name: Option<String>,

    /// Bearer credential; falls back to `MCP_RELAY_TOKEN`.
    #[arg(long)]
    token: Option<String>,

    /// Connect with wss instead of ws.
    #[arg(long)]
    tls: bool,

    /// Skip relay certificate verification (TLS only).
    #[arg(long)]
    insecure: bool,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("mcp-relay-agent bootstrap");

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("a process-wide TLS crypto provider was already installed");
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load_from_path(path)?,
        None => BridgeConfig::default(),
    };
    config.apply_overrides(ConfigOverrides {
        relay_address: args.relay,
        server_name: args.name,
        token: args.token,
        tls: args.tls,
        insecure_skip_verify: args.insecure,
    });
    config.load_credentials();
    config.validate()?;
    info!(
        relay = %config.relay_address,
        server_name = %config.server_name,
        tls = config.tls,
        "configuration loaded"
    );

    // ── Build the dispatcher ────────────────────────────
    let registry = Arc::new(tools::default_registry()?);
    info!(tools = registry.len(), "tool registry built");
    let engine = Engine::new(Dispatcher::new(registry, config.server_info()));

    // ── Connect ─────────────────────────────────────────
    let stream = connector::connect(&config.target()).await?;
    let stream = Arc::new(stream.with_close_timeout(config.close_timeout()));

    let root = CancellationToken::new();
    let ct = lifecycle::link_shutdown(&root);

    let keepalive_handle = config
        .keepalive_interval()
        .map(|interval| keepalive::spawn_keepalive(Arc::clone(&stream), interval, ct.clone()));

    info!("serving tools over relay connection");

    // ── Serve until shutdown or failure ─────────────────
    let outcome = lifecycle::run_until_shutdown(Arc::clone(&stream), &engine, ct.clone()).await;

    root.cancel();
    if let Some(handle) = keepalive_handle {
        if let Err(err) = handle.await {
            warn!(%err, "keepalive task did not finish cleanly");
        }
    }

    outcome?;
    info!("mcp-relay-agent shut down");
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

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
