use std::time::Duration;

use mock_telegram::MockBotApi;
use serde_json::json;
use shopbot_catalog::RecipientId;
use shopbot_core::{ChatId, ItemCard, Transport, TransportError};
use shopbot_telegram::{BotClient, TelegramTransport};
use tokio::net::TcpListener;

async fn transport(api: &MockBotApi, request_timeout: Duration) -> TelegramTransport {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = api.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let client = BotClient::new(reqwest::Client::new(), format!("http://{addr}"), "123:test")
        .with_request_timeout(request_timeout);
    TelegramTransport::new(client)
}

#[tokio::test]
async fn slow_reply_does_not_duplicate_owner_notice() {
    let api = MockBotApi::new();
    api.delay_method("sendMessage", Duration::from_millis(600));
    let transport = transport(&api, Duration::from_millis(150)).await;

    let err = transport
        .notify(&RecipientId::new("424242"), "New order!")
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Unavailable { .. }));

    // Longer than the first resend delay would have been.
    tokio::time::sleep(Duration::from_millis(900)).await;
    let sent = api.calls_to("sendMessage");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["chat_id"], json!(424242));
}

#[tokio::test]
async fn server_error_on_send_is_not_resent() {
    let api = MockBotApi::new();
    api.fail_method("sendPhoto", 502, "Bad Gateway");
    let transport = transport(&api, Duration::from_secs(5)).await;

    let card = ItemCard {
        image: "https://img.example/mug.png".into(),
        caption: "*Mug*".into(),
        controls: Vec::new(),
    };
    let err = transport
        .send_item(&ChatId::new("7"), &card)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "sendPhoto rejected by platform: Bad Gateway"
    );
    assert_eq!(api.calls_to("sendPhoto").len(), 1);
}
