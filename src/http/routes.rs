//! Notes API handlers.
//!
//! Each handler makes one gateway call and maps the outcome to a status
//! code. "Already exists" and "not found" are expected outcomes and are
//! logged at info; anything else from storage is an error log and a 500.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{GatewayError, Note, NoteFilter, NoteGateway};
use crate::http::response::ApiError;

pub const NOTES_PATH: &str = "/api/v1/notes";
pub const NOTE_PATH: &str = "/api/v1/notes/{title}";

/// State injected into the notes handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<NoteGateway>,
}

/// Notes routes without middleware.
pub fn notes_routes(state: AppState) -> Router {
    Router::new()
        .route(NOTES_PATH, get(get_notes).post(add_note).delete(delete_notes))
        .route(
            NOTE_PATH,
            get(get_note).post(update_note).delete(delete_note),
        )
        .with_state(state)
}

/// Query string of `GET /api/v1/notes`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Comma separated.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
}

impl ListQuery {
    pub fn filter(&self) -> NoteFilter {
        let tags: Vec<String> = self.tags.split(',').map(|t| t.trim().to_string()).collect();
        NoteFilter::new(&tags, &self.category, &self.date)
    }
}

fn parse_note(payload: Result<Json<Note>, JsonRejection>) -> Result<Note, ApiError> {
    let Json(note) = payload.map_err(|rejection| {
        tracing::info!(error = %rejection.body_text(), "Rejected note body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    let missing = note.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )));
    }
    Ok(note)
}

async fn add_note(
    State(state): State<AppState>,
    payload: Result<Json<Note>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let note = parse_note(payload)?;

    match state.gateway.add_note(note).await {
        Ok(stored) => Ok(Json(json!({ "note": stored }))),
        Err(e @ GatewayError::AlreadyExists(_)) => {
            tracing::info!(error = %e, "Note already exists");
            Err(ApiError::BadRequest(e.to_string()))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to add a note to the database");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

async fn get_notes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.filter();

    match state.gateway.get_notes_filtered(&filter).await {
        Ok(notes) => Ok(Json(json!({ "notes": notes }))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to get notes from database");
            Err(ApiError::Internal("failed to retrieve notes".into()))
        }
    }
}

async fn get_note(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.gateway.get_note(&title).await {
        Ok(note) => Ok(Json(json!({ "note": note }))),
        Err(e @ GatewayError::NotFound(_)) => {
            tracing::info!(title = %title, "Note does not exist");
            Err(ApiError::NotFound(e.to_string()))
        }
        Err(e) => {
            tracing::error!(title = %title, error = %e, "Failed to get note from database");
            Err(ApiError::Internal(format!("failed to retrieve note '{title}'")))
        }
    }
}

async fn update_note(
    State(state): State<AppState>,
    Path(title): Path<String>,
    payload: Result<Json<Note>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let note = parse_note(payload)?;

    match state.gateway.update_note(&title, note).await {
        Ok(stored) => Ok(Json(json!({ "note": stored }))),
        Err(e @ GatewayError::NotFound(_)) => {
            tracing::info!(title = %title, "Note does not exist");
            Err(ApiError::NotFound(e.to_string()))
        }
        Err(e @ GatewayError::AlreadyExists(_)) => {
            tracing::info!(title = %title, error = %e, "Update collides with an existing title");
            Err(ApiError::BadRequest(e.to_string()))
        }
        Err(e) => {
            tracing::error!(title = %title, error = %e, "Failed to update note");
            Err(ApiError::Internal(format!("failed to update note '{title}'")))
        }
    }
}

async fn delete_note(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.gateway.delete_note(&title).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) if e.is_not_found() => {
            tracing::info!(title = %title, "Note does not exist, nothing to delete");
            Err(ApiError::NoContent)
        }
        Err(e) => {
            tracing::error!(title = %title, error = %e, "Failed to delete note");
            Err(ApiError::Internal(format!("failed to delete note '{title}'")))
        }
    }
}

async fn delete_notes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    match state.gateway.delete_notes().await {
        Ok(deleted) => Ok(Json(json!({ "deleted": deleted }))),
        Err(e) if e.is_not_found() => {
            tracing::info!("No notes in database, nothing to delete");
            Err(ApiError::NoContent)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete notes");
            Err(ApiError::Internal("failed to delete notes".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::MemoryDriver;

    async fn app() -> (MemoryDriver, Router) {
        let driver = MemoryDriver::new();
        let gateway = NoteGateway::new(
            Arc::new(driver.clone()),
            DatabaseConfig {
                uri: "memory://".into(),
                name: "db".into(),
                collection: "notes".into(),
            },
        );
        gateway.connect().await.unwrap();
        let router = notes_routes(AppState {
            gateway: Arc::new(gateway),
        });
        (driver, router)
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn duplicate_title_is_bad_request() {
        let (_, router) = app().await;
        let note = json!({ "title": "t1", "description": "d" });

        let (status, _) = send(&router, Method::POST, NOTES_PATH, Some(note.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, Method::POST, NOTES_PATH, Some(note)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn missing_required_field_is_bad_request() {
        let (_, router) = app().await;
        let (status, body) = send(
            &router,
            Method::POST,
            NOTES_PATH,
            Some(json!({ "title": "t1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(
            &router,
            Method::POST,
            NOTES_PATH,
            Some(json!({ "title": "", "description": "d" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing required field(s): title");
    }

    #[tokio::test]
    async fn list_filters_by_query() {
        let (_, router) = app().await;
        for (title, tags, category) in [
            ("a", json!(["x", "y"]), "work"),
            ("b", json!(["y"]), "work"),
            ("c", json!(["x"]), "home"),
        ] {
            let note = json!({ "title": title, "description": "d", "tags": tags, "category": category });
            send(&router, Method::POST, NOTES_PATH, Some(note)).await;
        }

        let (status, body) = send(&router, Method::GET, NOTES_PATH, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notes"].as_array().unwrap().len(), 3);

        let (_, body) = send(&router, Method::GET, "/api/v1/notes?tags=x", None).await;
        assert_eq!(body["notes"].as_array().unwrap().len(), 2);

        let (_, body) = send(&router, Method::GET, "/api/v1/notes?tags=x,y&category=work", None).await;
        let notes = body["notes"].as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["title"], "a");

        let (_, body) = send(&router, Method::GET, "/api/v1/notes?tags=&category=&date=", None).await;
        assert_eq!(body["notes"].as_array().unwrap().len(), 3);

        let (_, body) = send(&router, Method::GET, "/api/v1/notes?category=none", None).await;
        assert_eq!(body["notes"], json!([]));
    }

    #[tokio::test]
    async fn update_and_delete_statuses() {
        let (_, router) = app().await;
        let note = json!({ "title": "t1", "description": "old" });
        send(&router, Method::POST, NOTES_PATH, Some(note)).await;

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/v1/notes/missing",
            Some(json!({ "title": "missing", "description": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/notes/t1",
            Some(json!({ "title": "t1", "description": "new" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["note"]["description"], "new");

        let (status, _) = send(&router, Method::DELETE, "/api/v1/notes/t1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, Method::DELETE, "/api/v1/notes/t1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn bulk_delete() {
        let (_, router) = app().await;
        let (status, _) = send(&router, Method::DELETE, NOTES_PATH, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        send(&router, Method::POST, NOTES_PATH, Some(json!({ "title": "a", "description": "d" }))).await;
        send(&router, Method::POST, NOTES_PATH, Some(json!({ "title": "b", "description": "d" }))).await;

        let (status, body) = send(&router, Method::DELETE, NOTES_PATH, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 2);
    }

    #[tokio::test]
    async fn storage_failure_is_internal_error() {
        let (driver, router) = app().await;
        driver.set_reachable(false);

        let (status, body) = send(&router, Method::GET, NOTES_PATH, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "failed to retrieve notes");

        let (status, _) = send(&router, Method::GET, "/api/v1/notes/t1", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn tags_query_splits_on_commas() {
        let query = ListQuery {
            tags: "a, b,,c".into(),
            ..ListQuery::default()
        };
        assert_eq!(query.filter().tags, vec!["a", "b", "c"]);
        assert!(ListQuery::default().filter().is_empty());
    }
}
