use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use autotext_proto::message_log::{LogMessageRequest, LogMessageResponse, LOG_MESSAGE_PATH};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::table::MessageTable;

pub fn router(table: MessageTable) -> Router {
    Router::new()
        .route(LOG_MESSAGE_PATH, post(log_message))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .with_state(table)
}

async fn log_message(
    State(table): State<MessageTable>,
    body: Result<Json<LogMessageRequest>, JsonRejection>,
) -> (StatusCode, Json<LogMessageResponse>) {
    let Json(entry) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("rejected log-message body: {}", rejection);
            return (
                rejection.status(),
                Json(LogMessageResponse::failed(rejection.body_text())),
            );
        }
    };

    match table.insert(entry).await {
        Ok(id) => {
            info!("logged message {}", id);
            (StatusCode::OK, Json(LogMessageResponse::ok(id)))
        }
        Err(e) => {
            error!("failed to log message: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LogMessageResponse::failed(e.to_string())),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    async fn call(router: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(LOG_MESSAGE_PATH)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn logs_and_returns_id() {
        let dir = tempfile::tempdir().unwrap();
        let table = MessageTable::open(dir.path().join("messages.jsonl")).await.unwrap();

        let (status, body) = call(
            router(table.clone()),
            r#"{"leadId": 12, "message": "Hi", "time": "2025-04-26T15:05:00Z"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"success": true, "messageId": 1}));

        let (_, body) = call(router(table.clone()), "{}").await;
        assert_eq!(body["messageId"], 2);

        let rows = table.rows().await.unwrap();
        assert_eq!(rows[0].lead_id, Some(serde_json::json!(12)));
        assert_eq!(rows[1].message, None);
    }

    #[tokio::test]
    async fn malformed_body_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let table = MessageTable::open(dir.path().join("messages.jsonl")).await.unwrap();

        let (status, body) = call(router(table.clone()), "not json").await;
        assert!(status.is_client_error());
        assert_eq!(body["success"], false);
        assert!(table.rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_a_500() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.jsonl");
        let table = MessageTable::open(&path).await.unwrap();
        // A directory where the file should be makes every append fail.
        tokio::fs::create_dir(&path).await.unwrap();

        let (status, body) = call(router(table), r#"{"leadId": 1}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("message table io"));
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let table = MessageTable::open(dir.path().join("messages.jsonl")).await.unwrap();
        let response = router(table)
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(LOG_MESSAGE_PATH)
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
