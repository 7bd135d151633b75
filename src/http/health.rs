//! Health-probe endpoints.
//!
//! Served on their own listener and router so probes keep answering while
//! application traffic is saturated: no in-flight limit, no body limit,
//! only the gateway is shared.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::db::NoteGateway;

pub const READINESS_PATH: &str = "/api/readyz";
pub const LIVENESS_PATH: &str = "/api/healthz";
pub const METRICS_PATH: &str = "/metrics";

#[derive(Clone)]
pub struct HealthState {
    pub gateway: Arc<NoteGateway>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn health_routes(state: HealthState) -> Router {
    let mut router = Router::new()
        .route(READINESS_PATH, get(readiness))
        .route(LIVENESS_PATH, get(liveness));

    if let Some(handle) = state.metrics.clone() {
        router = router.route(
            METRICS_PATH,
            get(move || std::future::ready(handle.render())),
        );
    }

    router.with_state(state)
}

async fn readiness(State(state): State<HealthState>) -> StatusCode {
    if state.gateway.is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn liveness() -> StatusCode {
    StatusCode::OK
}
