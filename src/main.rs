//! Hub pipeline server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum + tower-http layers)
//!                         │  decode body / query, request id
//!                         ▼
//!                     pipeline::Dispatcher ── walks the flattened route table
//!                         │                   (routing::Router, mounted hubs API)
//!                         │
//!              normal track: middleware → guards → terminal handler ──▶ store
//!              error track:  next error handler in scope → fallback 500
//!                         │
//!                         ▼
//!     Client Response ◀── ResponseSink (exactly one write)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use hub_pipeline::config::loader::{load_config, override_bind_address};
use hub_pipeline::config::AppConfig;
use hub_pipeline::lifecycle::{self, signals};
use hub_pipeline::observability::{logging, metrics};
use hub_pipeline::store::MemoryStore;

#[derive(Parser, Debug)]
#[command(name = "hub-pipeline", version, about = "Hub API on an ordered handler pipeline")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config = override_bind_address(config, bind)?;
    }

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hub-pipeline starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        mount_path = %config.api.mount_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(MemoryStore::new());
    let running = lifecycle::start(&config, store).await?;

    signals::wait_for_signal().await;
    running.stop().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
