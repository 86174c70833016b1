//! End-to-end conversations through the webhook
//!
//! Each step goes through a fresh app over the same mocks so that one step
//! has fully completed before the next one starts.

use kbchat_backend::QueryFailure;
use kbchat_sessions::SessionStore;
use kbchat_telegram::mock::Outbound;
use kbchat_telegram::ParseMode;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::*;

const HI_LOADING: &str = "कृपया प्रतीक्षा करें, हम आपका उत्तर ढूंढ रहे हैं...";
const HI_ERROR: &str = "क्षमा करें, अभी उत्तर नहीं मिल सका। कृपया थोड़ी देर बाद पुनः प्रयास करें।";

#[tokio::test]
async fn test_start_pick_ask_and_rate() {
    let fixture = Fixture::new();

    // /start: welcome, then the picker
    fixture.deliver(&[text_update(1, "/start")]).await;
    let outbound = fixture.transport.recorded();
    assert_eq!(outbound.len(), 2);
    match &outbound[1] {
        Outbound::Text {
            text,
            keyboard: Some(keyboard),
            ..
        } => {
            assert_eq!(text, "\nPlease select a Language to proceed");
            let labels: Vec<_> = keyboard.buttons().map(|b| b.callback_data.clone()).collect();
            assert_eq!(labels, vec!["lang_en", "lang_hi"]);
        }
        other => panic!("Expected language picker, got {:?}", other),
    }
    fixture.transport.reset();

    // Pick Hindi
    fixture.deliver(&[callback_update(2, 1001, "lang_hi")]).await;
    assert_eq!(
        fixture.store.get(&format!("{}_language", CHAT_ID)).await.unwrap(),
        Some("hi".to_string())
    );
    assert!(fixture.transport.sent_texts()[0].contains("हिंदी"));
    fixture.transport.reset();

    // Ask
    fixture.backend.answer_with("42", None);
    fixture.deliver(&[text_update(3, "What is the answer?")]).await;

    let request = &fixture.backend.recorded_requests()[0];
    assert_eq!(request.session_id, USER_ID.to_string());
    assert_eq!(request.language, "hi");
    assert_eq!(request.channel_id, "telegram");

    let outbound = fixture.transport.recorded();
    assert_eq!(outbound.len(), 3);
    assert!(matches!(&outbound[0], Outbound::Text { text, .. } if text == HI_LOADING));
    assert!(matches!(
        &outbound[1],
        Outbound::Text { text, parse_mode: Some(ParseMode::Markdown), .. } if text == "42"
    ));
    match &outbound[2] {
        Outbound::Text {
            text,
            keyboard: Some(keyboard),
            ..
        } => {
            assert_eq!(text, "Please provide your feedback");
            let payloads: Vec<_> = keyboard.buttons().map(|b| b.callback_data.clone()).collect();
            assert_eq!(payloads, vec!["message-liked__3", "message-disliked__3"]);
        }
        other => panic!("Expected feedback prompt, got {:?}", other),
    }
    fixture.transport.reset();

    // Rate, then tap the redrawn pair
    fixture
        .deliver(&[callback_update(4, 1002, "message-liked__3")])
        .await;
    fixture
        .deliver(&[callback_update(5, 1002, "replymessage_disliked")])
        .await;

    let outbound = fixture.transport.recorded();
    assert_eq!(outbound.len(), 3);
    assert_eq!(
        outbound[0],
        Outbound::CallbackAnswer {
            callback_id: "cb-4".to_string(),
            text: Some("Thanks for your feedback.".to_string()),
        }
    );
    match &outbound[1] {
        Outbound::Edit {
            message_id,
            text,
            keyboard: Some(keyboard),
            ..
        } => {
            assert_eq!(*message_id, 1002);
            assert_eq!(text, "Please provide your feedback:");
            let icons: Vec<_> = keyboard.buttons().map(|b| b.text.clone()).collect();
            assert_eq!(icons, vec!["👍", "👎🏻"]);
        }
        other => panic!("Expected redraw, got {:?}", other),
    }
    assert_eq!(
        outbound[2],
        Outbound::CallbackAnswer {
            callback_id: "cb-5".to_string(),
            text: None,
        }
    );
}

#[tokio::test]
async fn test_query_without_language_uses_default() {
    let fixture = Fixture::new();

    fixture.deliver(&[text_update(1, "hello")]).await;

    assert_eq!(fixture.backend.recorded_requests()[0].language, "en");
    assert_eq!(
        fixture.transport.sent_texts()[0],
        "Please wait while I fetch the answer for you..."
    );
}

#[tokio::test]
async fn test_backend_failure_sends_one_localized_error() {
    let fixture = Fixture::new();
    fixture.store.set(&format!("{}_language", CHAT_ID), "hi").await.unwrap();
    fixture
        .backend
        .fail_with(QueryFailure::InvalidResponse("missing response".to_string()));

    fixture.deliver(&[text_update(1, "hello")]).await;

    assert_eq!(
        fixture.transport.sent_texts(),
        vec![HI_LOADING.to_string(), HI_ERROR.to_string()]
    );
}

#[tokio::test]
async fn test_http_backend_round_trip_with_audio() {
    let server = MockServer::start().await;
    let audio_url = format!("{}/audio/answer.ogg", server.uri());

    Mock::given(method("POST"))
        .and(path("/chat/send"))
        .and(body_json(json!({
            "session_id": USER_ID.to_string(),
            "channel_id": "telegram",
            "text": "Balance?",
            "language": "en",
            "audio": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Your balance is *100*",
            "output": {"audio": audio_url}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/audio/answer.ogg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7_u8, 7, 7]))
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let app = kbchat_app::build_app(
        &fixture.config,
        fixture.services_with_http_backend(&server.uri()),
    );
    deliver_to(app, &[text_update(1, "Balance?")]).await;

    let outbound = fixture.transport.recorded();
    assert_eq!(outbound.len(), 4);
    assert!(matches!(
        &outbound[1],
        Outbound::Text { text, .. } if text == "Your balance is \\*100\\*"
    ));
    assert_eq!(
        outbound[3],
        Outbound::Voice {
            chat_id: CHAT_ID,
            audio: vec![7, 7, 7],
        }
    );
}

#[tokio::test]
async fn test_http_backend_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/send"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fixture = Fixture::new();
    let app = kbchat_app::build_app(
        &fixture.config,
        fixture.services_with_http_backend(&server.uri()),
    );
    deliver_to(app, &[text_update(1, "Balance?")]).await;

    assert_eq!(
        fixture.transport.sent_texts(),
        vec![
            "Please wait while I fetch the answer for you...".to_string(),
            "Sorry, I could not get an answer right now. Please try again in a little while."
                .to_string(),
        ]
    );
}

#[tokio::test]
async fn test_voice_question_forwards_file_url() {
    let fixture = Fixture::new();
    fixture
        .transport
        .set_file_url("voice-77", "https://api.telegram.org/file/bot123/voice/77.oga");

    fixture.deliver(&[voice_update(1, "voice-77")]).await;

    let request = &fixture.backend.recorded_requests()[0];
    assert_eq!(request.text, None);
    assert_eq!(
        request.audio_reference,
        "https://api.telegram.org/file/bot123/voice/77.oga"
    );
    assert_eq!(fixture.transport.recorded().len(), 3);
}

#[tokio::test]
async fn test_commands_for_other_bots_are_ignored() {
    let fixture = Fixture::new();

    fixture
        .deliver(&[text_update(1, "/help@kb_support_bot")])
        .await;
    assert_eq!(fixture.transport.sent_texts(), vec!["Help!".to_string()]);
    fixture.transport.reset();

    fixture
        .deliver(&[
            text_update(2, "/help@other_bot"),
            text_update(3, "/start@other_bot"),
        ])
        .await;
    assert!(fixture.transport.recorded().is_empty());
    assert!(fixture.backend.recorded_requests().is_empty());
}
