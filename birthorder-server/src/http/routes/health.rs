//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    /// Absent for the in-memory backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    pub timestamp: String,
    /// Seconds since startup
    pub uptime: f64,
    pub version: &'static str,
}

/// GET /health
///
/// Always 200; a failed storage ping reports `unhealthy`.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store();
    let backend = store.backend();

    let connected = match store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, %backend, "storage ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" },
        backend: backend.as_str(),
        database: backend
            .is_persistent()
            .then_some(if connected { "connected" } else { "disconnected" }),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime().as_secs_f64(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn memory_backend_is_healthy() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.backend, "memory");
        assert!(body.database.is_none());
    }
}
