//! HTTP management API for the NetGate appliance.
//!
//! Thin `axum` layer over [`netgate_core::Controller`]: handlers extract
//! and authorize, send a typed command or read a snapshot, and map
//! [`netgate_core::CoreError`] onto `{"detail"}` responses.

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod syslog;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use netgate_config::CorsSettings;

pub use error::ApiError;
pub use state::AppState;

/// Full application: routes, request log, tracing and CORS.
pub fn app(state: AppState, cors: &CorsSettings) -> Router {
    routes::routes(&state)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::record_request,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

fn cors_layer(cors: &CorsSettings) -> CorsLayer {
    if cors.origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = cors
        .origins
        .iter()
        .filter_map(|o| {
            HeaderValue::from_str(o.trim_end_matches('/'))
                .inspect_err(|e| warn!(origin = %o, error = %e, "ignoring CORS origin"))
                .ok()
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
