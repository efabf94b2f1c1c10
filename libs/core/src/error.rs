use crate::transport::TransportError;

/// Failures that escape a conversation handler.
///
/// User mistakes (unknown shop, empty cart, ...) are answered in chat and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("session store")]
    Session(#[source] anyhow::Error),
}

pub type ConversationResult<T = ()> = Result<T, ConversationError>;
