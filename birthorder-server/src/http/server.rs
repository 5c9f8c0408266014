//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS (the survey form may be served from anywhere)
//! - Tracing middleware and a per-request timeout
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;
use crate::config::ServerConfig;
use crate::state::AppState;
use crate::store::{self, StoreError};

/// Build the application router with every route nested under `/api`.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::map_response(timeout_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Give the timeout layer's empty 408 the usual JSON error body.
async fn timeout_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("request timed out");
        return ApiError::Timeout.into_response();
    }
    response
}

/// Open the configured store and run the HTTP server until shutdown.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = store::open(&config.store_config()).await?;
    let state = AppState::new(store);
    let app = build_router(state, config.request_timeout());

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(backend = %config.backend, "Server listening on {}", addr);
    tracing::info!("API: http://localhost:{}/api", addr.port());
    tracing::info!("Health: http://localhost:{}/api/health", addr.port());

    // Peer addresses feed the recorded ip address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage setup failed: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use birthorder_core::{FieldLayout, NewSubmission, Submission};
    use chrono::Utc;
    use tower::ServiceExt;

    use super::*;
    use crate::store::{Backend, MemoryStore, Paginated, Pagination, SubmissionStore};

    /// Store whose full scans never finish in time
    struct StalledStore;

    #[async_trait]
    impl SubmissionStore for StalledStore {
        fn backend(&self) -> Backend {
            Backend::Memory
        }

        fn export_layout(&self) -> FieldLayout {
            FieldLayout::Wire
        }

        async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
            Ok(submission.into_stored("stalled", Utc::now()))
        }

        async fn list(&self, page: Pagination) -> Result<Paginated<Submission>, StoreError> {
            Ok(Paginated {
                items: Vec::new(),
                total: 0,
                page: page.page,
                limit: page.limit,
            })
        }

        async fn list_by_region(&self, _region: &str) -> Result<Vec<Submission>, StoreError> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn all(&self) -> Result<Vec<Submission>, StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    fn app() -> Router {
        build_router(
            AppState::new(Arc::new(MemoryStore::new())),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn health_is_nested_under_api() {
        let response = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_renders_json_error() {
        let app = build_router(AppState::new(Arc::new(StalledStore)), Duration::from_secs(1));
        let response = app
            .oneshot(Request::get("/api/export-csv").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "error": "Request timed out" })
        );
    }
}
