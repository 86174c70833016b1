//! Webhook surface: status codes, health probes and hand-off to the workers

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use kbchat_telegram::mock::Outbound;
use serde_json::json;

mod common;
use common::*;

#[tokio::test]
async fn test_healthcheck() {
    let app = Fixture::new().app();

    let (status, body) = get(&app, "/healthcheck").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "The bot is still running fine :)");
    app.worker.drain().await;
}

#[tokio::test]
async fn test_health_and_root() {
    let app = Fixture::new().app();

    assert_eq!(get(&app, "/health").await, (StatusCode::OK, "OK".to_string()));
    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("KB chat bridge"));
    app.worker.drain().await;
}

#[tokio::test]
async fn test_update_is_acknowledged_and_processed() {
    let fixture = Fixture::new();

    fixture.deliver(&[text_update(1, "/help")]).await;

    assert_eq!(fixture.transport.sent_texts(), vec!["Help!".to_string()]);
}

#[tokio::test]
async fn test_malformed_update_is_rejected() {
    let fixture = Fixture::new();
    let app = fixture.app();

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/telegram")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    app.worker.drain().await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(fixture.transport.recorded().is_empty());
}

#[tokio::test]
async fn test_unhandled_update_kinds_are_accepted_and_ignored() {
    let fixture = Fixture::new();

    fixture
        .deliver(&[json!({"update_id": 7, "edited_message": {"message_id": 1}})])
        .await;

    assert!(fixture.transport.recorded().is_empty());
    assert!(fixture.backend.recorded_requests().is_empty());
}

#[tokio::test]
async fn test_many_chats_are_served_concurrently() {
    let fixture = Fixture::new();
    let app = fixture.app();

    for chat_id in 1..=20_i64 {
        let update = json!({
            "update_id": chat_id,
            "message": {
                "message_id": chat_id,
                "chat": {"id": chat_id, "type": "private", "first_name": "User"},
                "from": {"id": chat_id, "is_bot": false, "first_name": "User"},
                "text": "What is KYC?"
            }
        });
        let (status, _) = post_json(&app, "/telegram", update).await;
        assert_eq!(status, StatusCode::OK);
    }
    app.worker.drain().await;

    assert_eq!(fixture.backend.recorded_requests().len(), 20);
    for chat_id in 1..=20_i64 {
        let outbound = fixture.transport.recorded_for(chat_id);
        assert_eq!(outbound.len(), 3, "chat {chat_id} got {outbound:?}");
        assert!(matches!(&outbound[2], Outbound::Text { keyboard: Some(_), .. }));
    }
}

#[tokio::test]
async fn test_enqueue_after_shutdown_reports_unavailable() {
    let fixture = Fixture::new();
    let app = fixture.app();
    let router = app.router.clone();
    app.worker.drain().await;

    let response = tower::ServiceExt::oneshot(
        router,
        Request::builder()
            .method("POST")
            .uri("/telegram")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(text_update(1, "hello").to_string()))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
