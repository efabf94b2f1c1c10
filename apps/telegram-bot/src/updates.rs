//! Maps Bot API updates onto conversation events.

use shopbot_core::{ChatId, Command, EventKind, InboundEvent, MessageRef, ParsedText};
use shopbot_session::SessionKey;

use crate::telegram_api::{CallbackQuery, Message, Update};

/// Returns the event carried by `update`, or `None` for updates the bot ignores.
pub fn to_event(update: &Update) -> Option<InboundEvent> {
    if let Some(query) = &update.callback_query {
        return from_callback(query);
    }
    update.message.as_ref().and_then(from_message)
}

fn from_message(message: &Message) -> Option<InboundEvent> {
    let text = message.text.as_deref()?;
    let from = message.from.as_ref()?;
    let kind = match Command::parse(text) {
        ParsedText::Command(command) => EventKind::Command(command),
        ParsedText::Text(text) => EventKind::Text(text),
        ParsedText::UnknownCommand(name) => {
            tracing::debug!(command = %name, "ignoring unknown command");
            return None;
        }
    };
    let chat = message.chat.id.to_string();
    Some(InboundEvent::new(
        SessionKey::new(chat.clone(), from.id.to_string()),
        ChatId::new(chat),
        kind,
    ))
}

fn from_callback(query: &CallbackQuery) -> Option<InboundEvent> {
    let message = query.message.as_ref()?;
    let data = query.data.as_deref()?;
    let action = match data.parse() {
        Ok(action) => action,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring callback");
            return None;
        }
    };
    let chat = ChatId::new(message.chat.id.to_string());
    Some(InboundEvent::new(
        SessionKey::new(chat.as_str(), query.from.id.to_string()),
        chat.clone(),
        EventKind::Button {
            action,
            message: MessageRef::new(chat, message.message_id),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shopbot_core::Action;

    fn update(raw: serde_json::Value) -> Update {
        serde_json::from_value(raw).unwrap()
    }

    fn text_update(text: &str) -> Update {
        update(json!({
            "update_id": 1,
            "message": {
                "message_id": 9,
                "chat": {"id": -100},
                "from": {"id": 42},
                "text": text
            }
        }))
    }

    #[test]
    fn shop_command_is_keyed_by_chat_and_user() {
        let event = to_event(&text_update("/shop@DemoShopBot demo")).unwrap();
        assert_eq!(event.key, SessionKey::new("-100", "42"));
        assert_eq!(event.chat, ChatId::new("-100"));
        assert_eq!(
            event.kind,
            EventKind::Command(Command::Shop {
                args: vec!["demo".into()]
            })
        );
    }

    #[test]
    fn plain_text_becomes_text_event() {
        let event = to_event(&text_update("221B Baker Street")).unwrap();
        assert_eq!(event.kind, EventKind::Text("221B Baker Street".into()));
    }

    #[test]
    #[tracing_test::traced_test]
    fn unknown_commands_and_non_text_messages_are_skipped() {
        assert!(to_event(&text_update("/help")).is_none());
        let photo = update(json!({
            "update_id": 2,
            "message": {"message_id": 1, "chat": {"id": 1}, "from": {"id": 1}}
        }));
        assert!(to_event(&photo).is_none());
        assert!(logs_contain("ignoring unknown command"));
    }

    #[test]
    fn callback_carries_the_pressed_message() {
        let event = to_event(&update(json!({
            "update_id": 3,
            "callback_query": {
                "id": "cb",
                "from": {"id": 7},
                "message": {"message_id": 55, "chat": {"id": 7}},
                "data": "add_to_cart"
            }
        })))
        .unwrap();
        assert_eq!(
            event.kind,
            EventKind::Button {
                action: Action::AddToCart,
                message: MessageRef::new(ChatId::new("7"), 55),
            }
        );
        assert_eq!(event.key, SessionKey::new("7", "7"));
    }

    #[test]
    fn callbacks_with_unknown_data_are_skipped() {
        let stale = update(json!({
            "update_id": 4,
            "callback_query": {
                "id": "cb",
                "from": {"id": 7},
                "message": {"message_id": 55, "chat": {"id": 7}},
                "data": "wishlist"
            }
        }));
        assert!(to_event(&stale).is_none());
    }
}
