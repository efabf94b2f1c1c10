//! Telegram front end for the shopbot storefront.
//!
//! [`telegram_api`] speaks the Bot API over HTTPS, [`updates`] turns raw updates into
//! conversation events, [`transport`] renders replies back onto Telegram, and [`poller`]
//! drives the `getUpdates` loop.
pub mod config;
pub mod poller;
pub mod telegram_api;
pub mod transport;
pub mod updates;

use std::sync::Arc;

use shopbot_catalog::Catalog;
use shopbot_core::Conversation;

pub use config::BotConfig;
pub use poller::Poller;
pub use telegram_api::BotClient;
pub use transport::TelegramTransport;

/// Wires a poller for `catalog` with in-memory sessions.
pub fn build_poller(config: &BotConfig, catalog: Catalog) -> anyhow::Result<Poller> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("shopbot-telegram/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let client = BotClient::new(http, config.api_base.clone(), config.bot_token.clone());
    let transport = Arc::new(TelegramTransport::new(client.clone()));
    let conversation = Conversation::new(
        Arc::new(catalog),
        shopbot_session::shared_memory_store(),
        transport,
    );
    Ok(Poller::new(client, conversation, config.poll_timeout))
}
