//! Request middleware shared by the routers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Semaphore;

use crate::observability::metrics;

/// Bounds concurrently handled application requests.
///
/// Requests past the limit wait for a slot; the outer timeout layer
/// bounds how long.
#[derive(Debug, Clone)]
pub struct InFlightLimit {
    permits: Arc<Semaphore>,
    max: usize,
}

impl InFlightLimit {
    pub fn new(max: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.max - self.permits.available_permits()
    }
}

pub async fn limit_in_flight(
    State(limit): State<InFlightLimit>,
    request: Request,
    next: Next,
) -> Response {
    let Ok(_permit) = limit.permits.clone().acquire_owned().await else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    metrics::record_in_flight(limit.in_flight());

    let response = next.run(request).await;
    metrics::record_in_flight(limit.in_flight().saturating_sub(1));
    response
}

/// Records request count and latency, labelled with the router name.
pub async fn track_requests(
    State(router): State<&'static str>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;
    metrics::record_request(router, method, response.status().as_u16(), start);
    response
}
