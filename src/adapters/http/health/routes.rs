//! HTTP routes for the health endpoint.

use axum::{routing::get, Router};

use crate::adapters::websocket::RelayContext;

use super::handlers::healthcheck;

/// Creates the health router.
pub fn health_routes() -> Router<RelayContext> {
    Router::new().route("/healthcheck", get(healthcheck))
}
