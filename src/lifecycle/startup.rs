//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server (route table validated here)
//! - Bind the listener last
//! - Run the server in a background task tied to a [`Shutdown`]

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::store::HubStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A server accepting connections in the background.
pub struct Running {
    pub local_addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Running {
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Wait for the server task to end (after a shutdown trigger).
    pub async fn wait(self) -> Result<(), StartupError> {
        self.handle.await??;
        Ok(())
    }

    /// Trigger shutdown and wait for in-flight requests to drain.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        self.wait().await
    }
}

/// Build, bind, and spawn the server described by `config`.
pub async fn start(config: &AppConfig, store: Arc<dyn HubStore>) -> Result<Running, StartupError> {
    let server = HttpServer::new(config, store)?;

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    Ok(Running {
        local_addr,
        shutdown,
        handle,
    })
}
