//! [`Transport`] implementation on top of the Bot API.

use async_trait::async_trait;
use serde_json::{Value, json};
use shopbot_catalog::RecipientId;
use shopbot_core::{ChatId, ItemCard, Keyboard, MessageRef, Transport, TransportError};

use crate::telegram_api::{ApiError, BotClient, chat_id_value};

/// Item captions are written in Telegram's legacy Markdown.
const CAPTION_PARSE_MODE: &str = "Markdown";

pub struct TelegramTransport {
    client: BotClient,
}

impl TelegramTransport {
    pub fn new(client: BotClient) -> Self {
        Self { client }
    }

    /// New messages go out at most once; see [`BotClient::send`].
    async fn post(&self, method: &str, payload: Value) -> Result<(), TransportError> {
        self.client
            .send::<Value>(method, &payload)
            .await
            .map(|_| ())
            .map_err(TransportError::from)
    }

    async fn edit(&self, method: &str, payload: Value) -> Result<(), TransportError> {
        match self.client.call_with_retry::<Value>(method, &payload).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_modified() => {
                tracing::debug!(method, "edit left message unchanged");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl From<ApiError> for TransportError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected {
                method,
                description,
                ..
            } => TransportError::rejected(method, description),
            ApiError::Http { method, source } => TransportError::unavailable(method, source),
        }
    }
}

/// Renders the control panel as an `inline_keyboard` reply markup.
pub fn reply_markup(controls: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = controls
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| {
                    json!({
                        "text": button.label,
                        "callback_data": button.action.as_str(),
                    })
                })
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat: &ChatId, text: &str) -> Result<(), TransportError> {
        self.post(
            "sendMessage",
            json!({
                "chat_id": chat_id_value(chat.as_str()),
                "text": text,
            }),
        )
        .await
    }

    async fn send_item(&self, chat: &ChatId, card: &ItemCard) -> Result<(), TransportError> {
        self.post(
            "sendPhoto",
            json!({
                "chat_id": chat_id_value(chat.as_str()),
                "photo": card.image,
                "caption": card.caption,
                "parse_mode": CAPTION_PARSE_MODE,
                "reply_markup": reply_markup(&card.controls),
            }),
        )
        .await
    }

    async fn edit_item(
        &self,
        message: &MessageRef,
        card: &ItemCard,
    ) -> Result<(), TransportError> {
        self.edit(
            "editMessageMedia",
            json!({
                "chat_id": chat_id_value(message.chat.as_str()),
                "message_id": message.message_id,
                "media": {
                    "type": "photo",
                    "media": card.image,
                    "caption": card.caption,
                    "parse_mode": CAPTION_PARSE_MODE,
                },
                "reply_markup": reply_markup(&card.controls),
            }),
        )
        .await
    }

    async fn edit_caption(
        &self,
        message: &MessageRef,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.edit(
            "editMessageCaption",
            json!({
                "chat_id": chat_id_value(message.chat.as_str()),
                "message_id": message.message_id,
                "caption": caption,
            }),
        )
        .await
    }

    async fn notify(&self, recipient: &RecipientId, text: &str) -> Result<(), TransportError> {
        self.post(
            "sendMessage",
            json!({
                "chat_id": chat_id_value(recipient.as_str()),
                "text": text,
            }),
        )
        .await
    }
}
