//! Application state shared across handlers

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::store::SubmissionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn SubmissionStore>,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn SubmissionStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn store(&self) -> &dyn SubmissionStore {
        self.inner.store.as_ref()
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
