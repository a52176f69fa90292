//! HTTP handlers for the health endpoint.

use axum::{extract::State, Json};

use crate::adapters::websocket::RelayContext;

use super::dto::HealthResponse;

/// GET /healthcheck - Report that the instance is serving.
///
/// Does not touch the broker; a degraded instance still answers.
pub async fn healthcheck(State(context): State<RelayContext>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(context.port()))
}
