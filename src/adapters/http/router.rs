//! Application router: health endpoint, WebSocket endpoint, CORS and tracing.

use axum::Router;
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, RelayContext};

use super::health::health_routes;

/// Build the full router for one relay instance.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn app_router(context: RelayContext, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(websocket_router())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
