//! End-to-end tests of the notes API against live listeners.

mod common;

use std::time::Duration;

use common::{stall_request, test_config, TestService};
use notes_service::net::ListenerKind;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn note_crud_round_trip() {
    let mut service = TestService::start(test_config());
    let base = service.url(ListenerKind::Http).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/api/v1/notes"))
        .json(&json!({ "title": "t1", "description": "first", "tags": ["a"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["note"]["title"], "t1");
    assert!(!body["note"]["date"].as_str().unwrap().is_empty());

    let res = client
        .get(format!("{base}/api/v1/notes/t1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["note"]["description"], "first");

    let res = client
        .get(format!("{base}/api/v1/notes?tags=a"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["notes"].as_array().unwrap().len(), 1);

    let res = client
        .delete(format!("{base}/api/v1/notes/t1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{base}/api/v1/notes/t1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn duplicate_title_over_http() {
    let mut service = TestService::start(test_config());
    let base = service.url(ListenerKind::Http).await;
    let client = reqwest::Client::new();
    let note = json!({ "title": "dup", "description": "d" });

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        let res = client
            .post(format!("{base}/api/v1/notes"))
            .json(&note)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expected);
    }

    service.stop().await.unwrap();
}

#[tokio::test]
async fn probes_live_on_the_health_listener() {
    let mut service = TestService::start(test_config());
    let app = service.url(ListenerKind::Http).await;
    let health = service.url(ListenerKind::Health).await;
    let client = reqwest::Client::new();

    let status = |path: &'static str, base: String| {
        let client = client.clone();
        async move {
            client
                .get(format!("{base}{path}"))
                .send()
                .await
                .unwrap()
                .status()
        }
    };

    assert_eq!(status("/api/healthz", health.clone()).await, StatusCode::OK);
    assert_eq!(status("/api/readyz", health.clone()).await, StatusCode::OK);
    assert_eq!(status("/api/readyz", app.clone()).await, StatusCode::NOT_FOUND);
    assert_eq!(status("/api/v1/notes", health.clone()).await, StatusCode::NOT_FOUND);

    service.driver.set_reachable(false);
    assert_eq!(
        status("/api/readyz", health.clone()).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(status("/api/healthz", health).await, StatusCode::OK);

    service.driver.set_reachable(true);
    service.stop().await.unwrap();
}

#[tokio::test]
async fn metrics_are_served_on_the_health_listener() {
    let mut service = TestService::start(test_config());
    let app = service.url(ListenerKind::Http).await;
    let health = service.url(ListenerKind::Health).await;
    let client = reqwest::Client::new();

    client
        .get(format!("{app}/api/v1/notes"))
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("{health}/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = res.text().await.unwrap();
    assert!(text.contains("notes_http_requests_total"));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn health_answers_while_app_is_saturated() {
    let mut config = test_config();
    config.limits.max_in_flight = 1;
    config.timeouts.shutdown_secs = 1;
    let mut service = TestService::start(config);
    let app_addr = service.addr(ListenerKind::Http).await;
    let health = service.url(ListenerKind::Health).await;
    let client = reqwest::Client::new();

    let stalled = stall_request(app_addr, "/api/v1/notes").await;

    let queued = client
        .get(format!("http://{app_addr}/api/v1/notes"))
        .timeout(Duration::from_millis(500))
        .send()
        .await;
    assert!(queued.unwrap_err().is_timeout(), "app request should wait for a slot");

    let res = client
        .get(format!("{health}/api/readyz"))
        .timeout(Duration::from_secs(2))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    drop(stalled);
    service.stop().await.unwrap();
}
