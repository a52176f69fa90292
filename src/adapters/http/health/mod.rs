//! Health HTTP adapter - Liveness check for load balancers.

mod dto;
mod handlers;
mod routes;

pub use dto::HealthResponse;
pub use handlers::healthcheck;
pub use routes::health_routes;
