//! Submission persistence
//!
//! One [`SubmissionStore`] trait with three backends, chosen at startup:
//! - memory: process-local, lost on restart
//! - sqlite: relational table via sqlx
//! - mongodb: document collection
//!
//! Routes only ever see `Arc<dyn SubmissionStore>`.

pub mod memory;
pub mod mongo;
pub mod pagination;
pub mod sqlite;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use birthorder_core::{
    compute_statistics, FieldLayout, NewSubmission, StatisticsOutcome, Submission,
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use sqlite::SqliteStore;

/// Storage failure; the message is logged but never sent to clients.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("document field error: {0}")]
    DocumentField(#[from] mongodb::bson::document::ValueAccessError),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

impl StoreError {
    pub fn corrupt(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Available storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Memory,
    Sqlite,
    Mongodb,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Sqlite => "sqlite",
            Backend::Mongodb => "mongodb",
        }
    }

    /// Whether the backend talks to an external database
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Backend::Memory)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown backend '{0}' (expected memory, sqlite or mongodb)")]
pub struct UnknownBackend(String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Backend::Memory),
            "sqlite" => Ok(Backend::Sqlite),
            "mongodb" | "mongo" => Ok(Backend::Mongodb),
            other => Err(UnknownBackend(other.to_string())),
        }
    }
}

/// Persistence capability shared by every backend.
///
/// Listings are ordered by timestamp, newest first; records stored within the
/// same instant come back most recently inserted first.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    fn backend(&self) -> Backend;

    /// Column naming and order used for CSV export
    fn export_layout(&self) -> FieldLayout;

    /// Assign an id and timestamp, persist, and return the stored record.
    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError>;

    async fn list(&self, page: Pagination) -> Result<Paginated<Submission>, StoreError>;

    /// Exact match on the region string; unknown regions yield nothing.
    async fn list_by_region(&self, region: &str) -> Result<Vec<Submission>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Every stored record, newest first.
    async fn all(&self) -> Result<Vec<Submission>, StoreError>;

    /// Aggregate statistics over every record.
    async fn statistics(&self) -> Result<StatisticsOutcome, StoreError> {
        let records = self.all().await?;
        Ok(compute_statistics(&records))
    }

    /// Connectivity check
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Connection settings for the persistent backends
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: Backend,
    pub database_url: String,
    pub mongodb_uri: String,
}

/// Open the configured backend, creating schema and indexes as needed.
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn SubmissionStore>, StoreError> {
    let store: Arc<dyn SubmissionStore> = match config.backend {
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Sqlite => Arc::new(SqliteStore::connect(&config.database_url).await?),
        Backend::Mongodb => Arc::new(MongoStore::connect(&config.mongodb_uri).await?),
    };
    tracing::info!(backend = %config.backend, "submission store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parsing() {
        assert_eq!("memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert_eq!("SQLite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert_eq!("mongo".parse::<Backend>().unwrap(), Backend::Mongodb);
        assert!("postgres".parse::<Backend>().is_err());
    }

    #[test]
    fn only_memory_is_volatile() {
        assert!(!Backend::Memory.is_persistent());
        assert!(Backend::Sqlite.is_persistent());
        assert!(Backend::Mongodb.is_persistent());
    }
}
