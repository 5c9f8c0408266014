//! HTTP server command
//!
//! Runs the submission API with the selected storage backend.

use anyhow::{Context, Result};
use birthorder_server::{run_server, ServerConfig};
use clap::Parser;

use super::StoreArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on (default: 3000)
    #[arg(long, short = 'p', env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind to (default: 0.0.0.0)
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Per-request timeout in seconds (default: 30)
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl ServeArgs {
    fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        self.store.apply(&mut config);
        config
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.config();
    tracing::info!(
        backend = %config.backend,
        "Starting birthorder server on {}:{}",
        config.host,
        config.port
    );

    // Run server (blocks until shutdown)
    run_server(config).await.context("Server error")?;

    Ok(())
}
