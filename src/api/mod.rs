//! REST API module using Axum.
//!
//! Provides the AdPilot service boundary:
//! - `/api/v1/*` with a consistent `{data, meta}` / `{error, meta}` envelope
//! - legacy `/health` at root for probes
//! - restrictive same-origin CORS by default

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, Method, Uri};
use axum::response::Response;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `ADPILOT_CORS_ORIGINS` to a comma-separated list of allowed
/// origins for development.
fn build_cors_layer() -> CorsLayer {
    match std::env::var("ADPILOT_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Envelope-shaped 404 for unmatched paths.
async fn not_found(uri: Uri) -> Response {
    envelope::ApiErrorResponse::not_found(format!("no route for {}", uri.path()))
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state))
        .merge(routes::legacy_routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer())
}
