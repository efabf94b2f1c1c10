//! Shopbot core: the conversation state machine behind the storefront chat bot.
//!
//! Transports turn platform updates into [`InboundEvent`]s and hand them to a
//! [`Conversation`], which reads the [`Catalog`](shopbot_catalog::Catalog), updates the
//! shopper's session and answers through the [`Transport`] trait.
pub mod conversation;
pub mod error;
pub mod event;
pub mod render;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod transport;

pub use conversation::Conversation;
pub use error::{ConversationError, ConversationResult};
pub use event::{Action, Command, EventKind, InboundEvent, ParsedText, UnknownAction};
pub use render::{Order, Renderer};
pub use transport::{Button, ChatId, ItemCard, Keyboard, MessageRef, Transport, TransportError};
