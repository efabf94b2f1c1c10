//! Long-poll loop feeding Bot API updates into the conversation.

use std::future::Future;
use std::time::Duration;

use shopbot_core::Conversation;
use tokio::time::sleep;
use tracing::{Instrument, info, info_span, warn};

use crate::telegram_api::{ApiError, BotClient, Update};
use crate::transport::TelegramTransport;
use crate::updates::to_event;

/// Pause after a failed `getUpdates` before polling again.
const ERROR_BACKOFF: Duration = Duration::from_secs(3);

pub struct Poller {
    client: BotClient,
    conversation: Conversation<TelegramTransport>,
    poll_timeout: Duration,
}

impl Poller {
    pub fn new(
        client: BotClient,
        conversation: Conversation<TelegramTransport>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            client,
            conversation,
            poll_timeout,
        }
    }

    /// Polls until `shutdown` resolves. An update already fetched is always handled to completion.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut offset = None;
        info!(shops = self.conversation.catalog().len(), "polling for updates");
        loop {
            let fetched = tokio::select! {
                _ = &mut shutdown => break,
                fetched = self.client.get_updates(offset, self.poll_timeout) => fetched,
            };
            match fetched {
                Ok(updates) => offset = self.process(updates).await.or(offset),
                Err(err) => {
                    warn!(error = %err, "getUpdates failed");
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }
        info!("poller stopped");
    }

    /// Fetches and handles one batch. Returns the offset to poll with next.
    pub async fn poll_once(&self, offset: Option<i64>) -> Result<Option<i64>, ApiError> {
        let updates = self.client.get_updates(offset, self.poll_timeout).await?;
        Ok(self.process(updates).await.or(offset))
    }

    /// Handles updates strictly in order, so one shopper's presses never race each other.
    async fn process(&self, updates: Vec<Update>) -> Option<i64> {
        let mut next_offset = None;
        for update in updates {
            next_offset = Some(update.update_id + 1);
            let span = info_span!("telegram.update", update_id = update.update_id);
            self.process_one(update).instrument(span).await;
        }
        next_offset
    }

    async fn process_one(&self, update: Update) {
        if let Some(query) = &update.callback_query {
            if let Err(err) = self.client.answer_callback_query(&query.id).await {
                warn!(error = %err, "answerCallbackQuery failed");
            }
        }
        let Some(event) = to_event(&update) else {
            return;
        };
        if let Err(err) = self.conversation.handle(event).await {
            warn!(error = %err, "update handling failed");
        }
    }
}
