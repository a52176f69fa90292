//! HTTP DTOs for the health endpoint.

use serde::{Deserialize, Serialize};

/// Response for `GET /healthcheck`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub port: u16,
}

impl HealthResponse {
    pub fn ok(port: u16) -> Self {
        Self {
            status: "ok".to_string(),
            port,
        }
    }
}
