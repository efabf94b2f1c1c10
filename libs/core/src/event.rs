//! Inbound events delivered by a transport adapter.

use std::fmt;
use std::str::FromStr;

use shopbot_session::SessionKey;

use crate::transport::{ChatId, MessageRef};

/// One inbound update, already attributed to a shopper and a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub key: SessionKey,
    pub chat: ChatId,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(key: SessionKey, chat: ChatId, kind: EventKind) -> Self {
        Self { key, chat, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Command(Command),
    /// Press on a control panel button attached to `message`.
    Button { action: Action, message: MessageRef },
    Text(String),
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Command(Command::Start) => "start",
            EventKind::Command(Command::Shop { .. }) => "shop",
            EventKind::Button { .. } => "button",
            EventKind::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Shop { args: Vec<String> },
}

/// Outcome of classifying a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedText {
    Command(Command),
    /// A slash command the bot does not handle.
    UnknownCommand(String),
    Text(String),
}

impl Command {
    /// Classifies raw message text. Accepts the addressed `/shop@SomeBot` form.
    pub fn parse(text: &str) -> ParsedText {
        let Some(rest) = text.strip_prefix('/') else {
            return ParsedText::Text(text.to_string());
        };
        let mut words = rest.split_whitespace();
        let head = words.next().unwrap_or_default();
        let name = head.split_once('@').map_or(head, |(name, _bot)| name);
        match name {
            "start" => ParsedText::Command(Command::Start),
            "shop" => ParsedText::Command(Command::Shop {
                args: words.map(str::to_string).collect(),
            }),
            other => ParsedText::UnknownCommand(other.to_string()),
        }
    }
}

/// Control panel action tokens carried in button callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Back,
    Next,
    AddToCart,
    Checkout,
    Exit,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Back,
        Action::Next,
        Action::AddToCart,
        Action::Checkout,
        Action::Exit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Back => "back",
            Action::Next => "next",
            Action::AddToCart => "add_to_cart",
            Action::Checkout => "checkout",
            Action::Exit => "exit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action token {0:?}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == token)
            .ok_or_else(|| UnknownAction(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shop_with_arguments() {
        assert_eq!(
            Command::parse("/shop demo"),
            ParsedText::Command(Command::Shop {
                args: vec!["demo".into()]
            })
        );
        assert_eq!(
            Command::parse("/shop   a  b"),
            ParsedText::Command(Command::Shop {
                args: vec!["a".into(), "b".into()]
            })
        );
        assert_eq!(
            Command::parse("/shop"),
            ParsedText::Command(Command::Shop { args: vec![] })
        );
    }

    #[test]
    fn strips_bot_mention() {
        assert_eq!(
            Command::parse("/start@StoreBot"),
            ParsedText::Command(Command::Start)
        );
        assert_eq!(
            Command::parse("/shop@StoreBot demo"),
            ParsedText::Command(Command::Shop {
                args: vec!["demo".into()]
            })
        );
    }

    #[test]
    fn plain_text_and_unknown_commands() {
        assert_eq!(
            Command::parse("221B Baker St"),
            ParsedText::Text("221B Baker St".into())
        );
        assert_eq!(
            Command::parse("/help"),
            ParsedText::UnknownCommand("help".into())
        );
    }

    #[test]
    fn action_tokens_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>(), Ok(action));
        }
        assert_eq!(
            "buy".parse::<Action>(),
            Err(UnknownAction("buy".into()))
        );
    }
}
