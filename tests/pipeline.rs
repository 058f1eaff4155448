//! Pipeline lifecycle against a mock Telegram API server.
//!
//! `Bot` is pointed at a wiremock server via `set_api_url`, so the whole
//! `handle_link` sequence runs end-to-end: status message creation,
//! document upload, status deletion or edit, log channel notice, and
//! temporary file cleanup.

use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uplink_bot::config::Settings;
use uplink_bot::pipeline::{self, MSG_DOWNLOADING, MSG_INVALID_URL};
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT_ID: i64 = 5_550_001;

fn test_settings(max_file_size: u64, log_channel: Option<&str>) -> Arc<Settings> {
    Arc::new(Settings {
        bot_token: "123456:TESTTOKEN".to_string(),
        api_id: 1,
        api_hash: "testhash".to_string(),
        owner_id: 0,
        log_channel: log_channel.map(str::to_string),
        force_sub_channel: None,
        max_file_size,
    })
}

fn test_bot(api: &MockServer) -> Bot {
    let url = reqwest::Url::parse(&api.uri()).expect("mock server uri parses");
    Bot::new("123456:TESTTOKEN").set_api_url(url)
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client builds")
}

/// An inbound private text message, the shape the dispatcher would deliver.
fn incoming_private_message(text: &str) -> Message {
    serde_json::from_value(serde_json::json!({
        "message_id": 100,
        "date": 1_700_000_000,
        "chat": {"id": CHAT_ID, "type": "private", "first_name": "Tester"},
        "from": {"id": CHAT_ID, "is_bot": false, "first_name": "Tester"},
        "text": text,
    }))
    .expect("valid telegram message json")
}

/// A successful Bot API reply carrying a message with `message_id`.
fn message_response(message_id: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "ok": true,
        "result": {
            "message_id": message_id,
            "date": 1_700_000_000,
            "chat": {"id": CHAT_ID, "type": "private", "first_name": "Tester"},
            "text": "stub",
        }
    }))
}

/// Files in the working directory whose names start with `prefix`.
fn leftover_files(prefix: &str) -> Vec<String> {
    std::fs::read_dir(".")
        .expect("working directory is readable")
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(prefix))
        .collect()
}

/// Serves one request with `Content-Length: 1000` but closes the connection
/// after 100 bytes, so the body stream fails mid-transfer.
async fn truncated_file_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nContent-Type: application/octet-stream\r\n\r\n";
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&[0u8; 100]).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}/partial.bin")
}

#[tokio::test]
async fn invalid_input_gets_one_reply_and_nothing_else() {
    let tg = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/sendmessage$"))
        .and(body_partial_json(serde_json::json!({"text": MSG_INVALID_URL})))
        .respond_with(message_response(200))
        .expect(1)
        .mount(&tg)
        .await;

    pipeline::handle_link(
        test_bot(&tg),
        incoming_private_message("hello"),
        http_client(),
        test_settings(1024, None),
    )
    .await
    .expect("handler reports no error");

    let requests = tg.received_requests().await.expect("requests recorded");
    assert_eq!(
        requests.len(),
        1,
        "invalid input must cause exactly one API call (the reply), not a status message"
    );
}

#[tokio::test]
async fn success_deletes_status_and_sends_one_log_notice() {
    let files = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mirror.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 1024]))
        .mount(&files)
        .await;

    let tg = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/sendmessage$"))
        .and(body_partial_json(serde_json::json!({"text": MSG_DOWNLOADING})))
        .respond_with(message_response(777))
        .expect(1)
        .mount(&tg)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/senddocument$"))
        .respond_with(message_response(778))
        .expect(1)
        .mount(&tg)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/deletemessage$"))
        .and(body_partial_json(serde_json::json!({"message_id": 777})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": true,
        })))
        .expect(1)
        .mount(&tg)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/sendmessage$"))
        .and(body_partial_json(serde_json::json!({
            "chat_id": "@uploads_log",
            "text": "📤 File uploaded: mirror.bin by Tester",
        })))
        .respond_with(message_response(779))
        .expect(1)
        .mount(&tg)
        .await;

    let url = format!("{}/mirror.bin", files.uri());
    pipeline::handle_link(
        test_bot(&tg),
        incoming_private_message(&url),
        http_client(),
        test_settings(2_000_000_000, Some("@uploads_log")),
    )
    .await
    .expect("handler reports no error");

    assert!(
        leftover_files("mirror.bin.").is_empty(),
        "temporary file must be removed after a successful upload"
    );
    let requests = tg.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 4, "status, document, delete, log notice");
}

#[tokio::test]
async fn midstream_failure_edits_status_once_and_removes_partial_file() {
    let url = truncated_file_server().await;

    let tg = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/sendmessage$"))
        .and(body_partial_json(serde_json::json!({"text": MSG_DOWNLOADING})))
        .respond_with(message_response(888))
        .expect(1)
        .mount(&tg)
        .await;
    Mock::given(method("POST"))
        .and(path_regex("(?i)/editmessagetext$"))
        .and(body_partial_json(serde_json::json!({"message_id": 888})))
        .respond_with(message_response(888))
        .expect(1)
        .mount(&tg)
        .await;

    pipeline::handle_link(
        test_bot(&tg),
        incoming_private_message(&url),
        http_client(),
        test_settings(2_000_000_000, None),
    )
    .await
    .expect("handler reports no error");

    assert!(
        leftover_files("partial.bin.").is_empty(),
        "partial temporary file must be removed after a mid-stream failure"
    );
    let requests = tg.received_requests().await.expect("requests recorded");
    assert_eq!(
        requests.len(),
        2,
        "exactly one status creation and one status edit; no delete, no document"
    );
}
