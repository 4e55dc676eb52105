mod api;

use anyhow::{Context, Result};
use api::AppState;
use clap::Parser;
use resmon_core::{AlertEvaluator, MetricSampler, ProcessManager};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resmon-daemon")]
#[command(about = "Local resource monitor serving host metrics over HTTP", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 19527)]
    port: u16,

    /// Address to bind; keep this on loopback
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Upper bound for a single OS query, in milliseconds
    #[arg(long, default_value_t = 5000)]
    os_timeout_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Both constructors do an initial OS refresh, so keep them off the runtime.
    let (sampler, processes) = tokio::task::spawn_blocking(|| {
        let sampler = MetricSampler::system();
        sampler.prime();
        (sampler, ProcessManager::system())
    })
    .await
    .context("failed to initialise system probes")?;

    let state = AppState {
        sampler: Arc::new(sampler),
        processes: Arc::new(processes),
        alerts: Arc::new(AlertEvaluator::new()),
        os_timeout: Duration::from_millis(cli.os_timeout_ms),
    };

    let addr = SocketAddr::new(cli.bind, cli.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
