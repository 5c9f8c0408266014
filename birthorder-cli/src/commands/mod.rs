//! Subcommand implementations

pub mod export;
pub mod serve;
pub mod stats;

use anyhow::{Context, Result};
use birthorder_server::store::{self, SubmissionStore};
use birthorder_server::{Backend, ServerConfig, StoreConfig};
use clap::Args;
use std::sync::Arc;

/// Storage selection shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Storage backend: memory, sqlite or mongodb
    #[arg(long, env = "BIRTHORDER_BACKEND")]
    pub backend: Option<Backend>,

    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,
}

impl StoreArgs {
    /// Overlay explicit flags on an environment-derived config.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(uri) = &self.mongodb_uri {
            config.mongodb_uri = uri.clone();
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        let mut config = ServerConfig::from_env();
        self.apply(&mut config);
        config.store_config()
    }
}

/// Open a store for one-shot commands.
pub async fn open_store(args: &StoreArgs) -> Result<Arc<dyn SubmissionStore>> {
    let config = args.store_config();
    if !config.backend.is_persistent() {
        tracing::warn!("memory backend holds no data outside a running server");
    }
    store::open(&config)
        .await
        .with_context(|| format!("Failed to open {} store", config.backend))
}
