//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Plain / TLS listener
//!     → server.rs app_router (request id, trace, timeout, body limit,
//!       metrics, in-flight limit)
//!     → routes.rs (notes handlers → gateway)
//!     → response.rs (gateway errors → status + JSON body)
//!
//! Health listener
//!     → server.rs health_router (trace, metrics)
//!     → health.rs (liveness, readiness, Prometheus text)
//! ```

pub mod health;
pub mod middleware;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::ApiError;
pub use routes::AppState;
pub use server::{app_router, health_router};
