//! conn-warden server.
//!
//! ```text
//!   client ──▶ request id ─▶ trace ─▶ timeout ─┬─▶ /health, /ping
//!                                              └─▶ request guard ─▶ /admin
//!                                                    │
//!                                                    ▼
//!                               ResourceRegistry ── Supervisor ── probe / recovery
//!                                                    ▲
//!               keep-alive scheduler ────────────────┘
//!               self-ping scheduler  ──▶ GET {external_url}/ping
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use conn_warden::config::{resolve_config, PlatformEnv};
use conn_warden::lifecycle::{wait_for_signal, Services, Shutdown};
use conn_warden::observability::{init_logging, metrics};
use conn_warden::WardenServer;

#[derive(Parser)]
#[command(name = "conn-warden", version)]
#[command(about = "Keeps connections to external resources alive and recoverable", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.bind)?;

    init_logging(config.observability.log_format);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "conn-warden starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        resources = config.resources.len(),
        request_timeout_secs = config.listener.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let platform = PlatformEnv::from_env(&config.platform);
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let services = Arc::new(Services::bootstrap(config, platform)?);
    let unavailable = services.connect_all().await;
    if !unavailable.is_empty() {
        tracing::warn!(resources = ?unavailable, "Starting with unavailable resources");
    }
    services.start_background();

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let server = WardenServer::new(services.clone());
    server.run(listener, shutdown.token()).await?;

    services.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
