//! API route definitions.
//!
//! - `/api/v1/health`   — liveness
//! - `/api/v1/status`   — working-set and model introspection
//! - `/api/v1/allocate` — budget-split resolution
//! - `/api/v1/abtest`   — campaign submission + variation recommendation

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// Create all API routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/status", get(handlers::get_status))
        .route("/allocate", post(handlers::allocate_budget))
        .route("/abtest", post(handlers::recommend_variation))
        .with_state(state)
}

/// Legacy health endpoint at root level.
pub fn legacy_routes() -> Router {
    Router::new().route("/health", get(handlers::legacy_health_check))
}
