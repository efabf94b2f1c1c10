//! In-memory transport and fixtures for exercising the conversation controller.

use std::sync::Mutex;

use async_trait::async_trait;
use shopbot_catalog::{Catalog, Item, Price, RecipientId, Shop};

use crate::transport::{ChatId, ItemCard, MessageRef, Transport, TransportError};

/// One outbound call as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text { chat: ChatId, text: String },
    Item { chat: ChatId, card: ItemCard },
    EditItem { message: MessageRef, card: ItemCard },
    EditCaption { message: MessageRef, caption: String },
    Notify { recipient: RecipientId, text: String },
}

impl Outbound {
    /// Caption of a sent or edited item card.
    pub fn caption(&self) -> Option<&str> {
        match self {
            Outbound::Item { card, .. } | Outbound::EditItem { card, .. } => Some(&card.caption),
            Outbound::EditCaption { caption, .. } => Some(caption),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Outbound::Text { text, .. } | Outbound::Notify { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Records every call; `notify` can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Outbound>>,
    fail_notify: Mutex<bool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_notifications(&self, fail: bool) {
        *self.fail_notify.lock().unwrap() = fail;
    }

    /// Returns and clears everything recorded so far.
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    fn push(&self, outbound: Outbound) {
        self.sent.lock().unwrap().push(outbound);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat: &ChatId, text: &str) -> Result<(), TransportError> {
        self.push(Outbound::Text {
            chat: chat.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_item(&self, chat: &ChatId, card: &ItemCard) -> Result<(), TransportError> {
        self.push(Outbound::Item {
            chat: chat.clone(),
            card: card.clone(),
        });
        Ok(())
    }

    async fn edit_item(
        &self,
        message: &MessageRef,
        card: &ItemCard,
    ) -> Result<(), TransportError> {
        self.push(Outbound::EditItem {
            message: message.clone(),
            card: card.clone(),
        });
        Ok(())
    }

    async fn edit_caption(
        &self,
        message: &MessageRef,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.push(Outbound::EditCaption {
            message: message.clone(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn notify(&self, recipient: &RecipientId, text: &str) -> Result<(), TransportError> {
        if *self.fail_notify.lock().unwrap() {
            return Err(TransportError::rejected(
                "sendMessage",
                "Bad Request: chat not found",
            ));
        }
        self.push(Outbound::Notify {
            recipient: recipient.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

pub fn item(name: &str, units: u64) -> Item {
    Item {
        name: name.to_string(),
        tag: "General".to_string(),
        price: Price::from_units(units),
        image: format!("https://img.example/{}.png", name.to_lowercase()),
    }
}

/// `demo` sells a Mug (10) and a Shirt (25); `empty` sells nothing.
pub fn demo_catalog() -> Catalog {
    let shops = [
        (
            "demo".to_string(),
            Shop {
                owner_id: RecipientId::new("owner-1"),
                items: vec![item("Mug", 10), item("Shirt", 25)],
            },
        ),
        (
            "empty".to_string(),
            Shop {
                owner_id: RecipientId::new("owner-2"),
                items: Vec::new(),
            },
        ),
    ];
    match Catalog::new("$", shops) {
        Ok(catalog) => catalog,
        Err(err) => panic!("demo catalog is invalid: {err}"),
    }
}
