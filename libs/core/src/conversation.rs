//! Conversation controller: browse, cart, checkout, receipt.

use std::sync::Arc;

use metrics::counter;
use shopbot_catalog::{Catalog, Item, Shop};
use shopbot_session::{CheckoutError, Session, SessionKey, SharedSessionStore};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::error::{ConversationError, ConversationResult};
use crate::event::{Action, Command, EventKind, InboundEvent};
use crate::render::{self, Order, Renderer};
use crate::transport::{ChatId, MessageRef, Transport};

/// Where an item card is drawn.
#[derive(Debug, Clone, Copy)]
enum Surface<'a> {
    /// Reply to a command with a new photo message.
    Fresh(&'a ChatId),
    /// Redraw the card a button was pressed on.
    InPlace(&'a MessageRef),
}

impl Surface<'_> {
    fn chat(&self) -> &ChatId {
        match self {
            Surface::Fresh(chat) => chat,
            Surface::InPlace(message) => &message.chat,
        }
    }
}

pub struct Conversation<T: ?Sized> {
    catalog: Arc<Catalog>,
    sessions: SharedSessionStore,
    transport: Arc<T>,
    renderer: Renderer,
}

impl<T> Conversation<T>
where
    T: Transport + ?Sized,
{
    pub fn new(catalog: Arc<Catalog>, sessions: SharedSessionStore, transport: Arc<T>) -> Self {
        let renderer = Renderer::new(catalog.currency());
        Self {
            catalog,
            sessions,
            transport,
            renderer,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs the handler for one inbound event to completion.
    pub async fn handle(&self, event: InboundEvent) -> ConversationResult {
        let kind = event.kind.label();
        counter!("shopbot_events_total", "kind" => kind).increment(1);
        let span = info_span!(
            "conversation.handle",
            chat_id = %event.chat,
            user_id = %event.key.user_id,
            kind
        );
        self.dispatch(event).instrument(span).await
    }

    async fn dispatch(&self, event: InboundEvent) -> ConversationResult {
        let InboundEvent { key, chat, kind } = event;
        match kind {
            EventKind::Command(Command::Start) => self.say(&chat, render::WELCOME).await,
            EventKind::Command(Command::Shop { args }) => self.open_shop(&key, &chat, &args).await,
            EventKind::Button { action, message } => self.press(&key, action, &message).await,
            EventKind::Text(text) => self.receive_text(&key, &chat, text).await,
        }
    }

    async fn open_shop(
        &self,
        key: &SessionKey,
        chat: &ChatId,
        args: &[String],
    ) -> ConversationResult {
        let [shop_id] = args else {
            return self.say(chat, render::SHOP_USAGE).await;
        };
        if self.catalog.lookup(shop_id).is_none() {
            debug!(shop_id = %shop_id, "unknown shop requested");
            return self.say(chat, render::SHOP_NOT_FOUND).await;
        }

        let mut session = self.load(key).await?;
        session.select_shop(shop_id.as_str());
        self.store(key, session.clone()).await?;
        self.render(&session, Surface::Fresh(chat)).await
    }

    async fn press(
        &self,
        key: &SessionKey,
        action: Action,
        message: &MessageRef,
    ) -> ConversationResult {
        debug!(action = %action, message_id = message.message_id, "button pressed");
        match action {
            Action::Back | Action::Next => self.navigate(key, action, message).await,
            Action::AddToCart => self.add_to_cart(key, message).await,
            Action::Checkout => self.checkout(key, &message.chat).await,
            Action::Exit => Ok(self
                .transport
                .edit_caption(message, render::FAREWELL)
                .await?),
        }
    }

    async fn navigate(
        &self,
        key: &SessionKey,
        action: Action,
        message: &MessageRef,
    ) -> ConversationResult {
        let mut session = self.load(key).await?;
        let Some(shop) = self.selected_shop(&session) else {
            return self.say(&message.chat, render::NO_SHOP_SELECTED).await;
        };
        match action {
            Action::Back => session.step_back(),
            _ => session.step_next(shop.len()),
        };
        self.store(key, session.clone()).await?;
        self.render(&session, Surface::InPlace(message)).await
    }

    async fn add_to_cart(&self, key: &SessionKey, message: &MessageRef) -> ConversationResult {
        let mut session = self.load(key).await?;
        let Some((shop_id, item)) = self.current_item(&session) else {
            let text = match session.current_shop() {
                Some(_) => render::NO_ITEMS,
                None => render::NO_SHOP_SELECTED,
            };
            return self.say(&message.chat, text).await;
        };
        counter!("shopbot_cart_additions_total", "shop" => shop_id.clone()).increment(1);
        session.add_to_cart(item.clone());
        self.store(key, session.clone()).await?;

        self.say(&message.chat, &self.renderer.added_to_cart(&item)).await?;
        self.render(&session, Surface::InPlace(message)).await
    }

    async fn checkout(&self, key: &SessionKey, chat: &ChatId) -> ConversationResult {
        let mut session = self.load(key).await?;
        match session.begin_checkout() {
            Ok(total) => {
                self.store(key, session.clone()).await?;
                let summary = self.renderer.checkout_summary(session.cart(), total);
                self.say(chat, &summary).await
            }
            Err(CheckoutError::EmptyCart) => self.say(chat, render::CART_EMPTY).await,
            Err(CheckoutError::NoShop) => self.say(chat, render::NO_SHOP_SELECTED).await,
        }
    }

    async fn receive_text(
        &self,
        key: &SessionKey,
        chat: &ChatId,
        text: String,
    ) -> ConversationResult {
        let stored = self
            .sessions
            .get(key)
            .await
            .map_err(ConversationError::Session)?;
        let Some(mut session) = stored.filter(Session::is_awaiting_address) else {
            debug!("text outside checkout ignored");
            return Ok(());
        };
        let Some(done) = session.complete_checkout(Uuid::new_v4()) else {
            return Ok(());
        };
        let Some(shop) = self.catalog.lookup(&done.shop_id) else {
            return self.say(chat, render::SHOP_NOT_FOUND).await;
        };
        let order = Order {
            transaction_id: done.transaction_id,
            items: done.items,
            address: text,
        };

        self.transport
            .notify(&shop.owner_id, &self.renderer.owner_notice(&order))
            .await?;
        self.store(key, session).await?;
        counter!("shopbot_orders_total", "shop" => done.shop_id.clone()).increment(1);
        info!(
            shop_id = %done.shop_id,
            transaction_id = %order.transaction_id,
            items = order.items.len(),
            total = %order.total(),
            "order submitted"
        );

        self.say(chat, &self.renderer.receipt(&order)).await
    }

    async fn render(&self, session: &Session, surface: Surface<'_>) -> ConversationResult {
        let card = match self.current_item(session) {
            Some((_, item)) => self.renderer.item_card(&item),
            None => {
                let text = match session.current_shop() {
                    Some(_) => render::NO_ITEMS,
                    None => render::NO_SHOP_SELECTED,
                };
                return self.say(surface.chat(), text).await;
            }
        };
        match surface {
            Surface::Fresh(chat) => self.transport.send_item(chat, &card).await?,
            Surface::InPlace(message) => self.transport.edit_item(message, &card).await?,
        }
        Ok(())
    }

    fn selected_shop(&self, session: &Session) -> Option<&Shop> {
        session
            .current_shop()
            .and_then(|shop_id| self.catalog.lookup(shop_id))
    }

    fn current_item(&self, session: &Session) -> Option<(String, Item)> {
        let cursor = session.cursor()?;
        let item = self.catalog.lookup(&cursor.shop_id)?.item(cursor.index)?;
        Some((cursor.shop_id.clone(), item.clone()))
    }

    async fn say(&self, chat: &ChatId, text: &str) -> ConversationResult {
        Ok(self.transport.send_text(chat, text).await?)
    }

    async fn load(&self, key: &SessionKey) -> ConversationResult<Session> {
        self.sessions
            .load(key)
            .await
            .map_err(ConversationError::Session)
    }

    async fn store(&self, key: &SessionKey, session: Session) -> ConversationResult {
        self.sessions
            .save(key, session)
            .await
            .map_err(ConversationError::Session)
    }
}
