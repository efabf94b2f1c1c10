//! Outbound seam between the conversation controller and a chat platform.

use std::fmt;

use async_trait::async_trait;
use shopbot_catalog::RecipientId;

use crate::event::Action;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message previously sent by the bot, addressable for edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: i64,
}

impl MessageRef {
    pub fn new(chat: ChatId, message_id: i64) -> Self {
        Self { chat, message_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

/// Rows of buttons rendered under a photo.
pub type Keyboard = Vec<Vec<Button>>;

/// Photo with a Markdown caption and its control panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCard {
    pub image: String,
    pub caption: String,
    pub controls: Keyboard,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{method} rejected by platform: {description}")]
    Rejected { method: String, description: String },
    #[error("{method} failed")]
    Unavailable {
        method: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransportError {
    pub fn rejected(method: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Rejected {
            method: method.into(),
            description: description.into(),
        }
    }

    pub fn unavailable(
        method: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Unavailable {
            method: method.into(),
            source: source.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat: &ChatId, text: &str) -> Result<(), TransportError>;

    async fn send_item(&self, chat: &ChatId, card: &ItemCard) -> Result<(), TransportError>;

    /// Replaces photo, caption and controls of `message` in place.
    async fn edit_item(&self, message: &MessageRef, card: &ItemCard)
    -> Result<(), TransportError>;

    /// Replaces only the caption of `message`; its controls are dropped.
    async fn edit_caption(&self, message: &MessageRef, caption: &str)
    -> Result<(), TransportError>;

    /// Sends text to an arbitrary recipient, such as a shop owner.
    async fn notify(&self, recipient: &RecipientId, text: &str) -> Result<(), TransportError>;
}
