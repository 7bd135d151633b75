//! Router assembly.
//!
//! # Responsibilities
//! - Build the application router shared by the plain and TLS listeners
//! - Build the separate health-probe router
//! - Wire up middleware (request id, tracing, timeout, limits, metrics)

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::db::NoteGateway;
use crate::http::health::{health_routes, HealthState};
use crate::http::middleware::{limit_in_flight, track_requests, InFlightLimit};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::routes::{notes_routes, AppState};

fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request),
    )
}

/// Router for application traffic.
#[allow(deprecated)]
pub fn app_router(gateway: Arc<NoteGateway>, config: &ServiceConfig) -> Router {
    let limit = InFlightLimit::new(config.limits.max_in_flight);

    notes_routes(AppState { gateway })
        .layer(middleware::from_fn_with_state(limit, limit_in_flight))
        .layer(middleware::from_fn_with_state("app", track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.limits.body_bytes))
                // Timeout requires a `Default` response body; keep it inside the limit.
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                ))),
        )
}

/// Router for the health-probe listener.
pub fn health_router(gateway: Arc<NoteGateway>, metrics: Option<PrometheusHandle>) -> Router {
    health_routes(HealthState { gateway, metrics })
        .layer(middleware::from_fn_with_state("health", track_requests))
        .layer(TraceLayer::new_for_http())
}
