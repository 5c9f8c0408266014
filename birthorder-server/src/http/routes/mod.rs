//! Route handlers organized by resource

pub mod health;
pub mod submissions;

use axum::Router;

use crate::state::AppState;

/// Every API route, relative to the `/api` prefix
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(submissions::router())
}
