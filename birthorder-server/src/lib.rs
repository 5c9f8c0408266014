//! birthorder-server: HTTP API and storage backends for birth-order research
//!
//! Accepts survey submissions, lists and filters them, computes aggregate
//! statistics and exports CSV. Storage is pluggable (memory, SQLite, MongoDB)
//! behind [`store::SubmissionStore`].

pub mod config;
pub mod http;
pub mod state;
pub mod store;

pub use config::ServerConfig;
pub use http::{build_router, run_server, ApiError, ServerError};
pub use state::AppState;
pub use store::{Backend, StoreConfig, StoreError, SubmissionStore};
