//! HTTP adapters - Router composition and plain HTTP endpoints.

pub mod health;
pub mod router;

pub use health::{health_routes, HealthResponse};
pub use router::app_router;
