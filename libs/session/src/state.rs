//! Typed shopping session and its transitions.

use serde::{Deserialize, Serialize};
use shopbot_catalog::{Item, Price};
use uuid::Uuid;

/// Position inside the selected shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub shop_id: String,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    #[default]
    None,
    /// Cart summary was shown; the next free-text message is the delivery address.
    WaitingForAddress { shop_id: String },
}

/// Coarse conversation phase derived from the session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Browsing,
    AwaitingAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("no shop selected")]
    NoShop,
}

/// Cart contents handed over when an address completes the checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedCheckout {
    pub shop_id: String,
    pub transaction_id: Uuid,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    cursor: Option<Cursor>,
    cart: Vec<Item>,
    checkout: CheckoutState,
    last_transaction_id: Option<Uuid>,
}

impl Session {
    pub fn current_shop(&self) -> Option<&str> {
        self.cursor.as_ref().map(|c| c.shop_id.as_str())
    }

    pub fn current_item(&self) -> Option<usize> {
        self.cursor.as_ref().map(|c| c.index)
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn cart(&self) -> &[Item] {
        &self.cart
    }

    pub fn cart_total(&self) -> Price {
        self.cart.iter().map(|item| item.price).sum()
    }

    pub fn checkout(&self) -> &CheckoutState {
        &self.checkout
    }

    pub fn is_awaiting_address(&self) -> bool {
        matches!(self.checkout, CheckoutState::WaitingForAddress { .. })
    }

    pub fn last_transaction_id(&self) -> Option<Uuid> {
        self.last_transaction_id
    }

    pub fn phase(&self) -> Phase {
        if self.is_awaiting_address() {
            Phase::AwaitingAddress
        } else if self.cursor.is_some() {
            Phase::Browsing
        } else {
            Phase::Idle
        }
    }

    /// Points the session at the first item of `shop_id`. Cart and checkout state are kept.
    pub fn select_shop(&mut self, shop_id: impl Into<String>) {
        self.cursor = Some(Cursor {
            shop_id: shop_id.into(),
            index: 0,
        });
    }

    /// Moves one item back, stopping at the first. Returns false without a selected shop.
    pub fn step_back(&mut self) -> bool {
        match self.cursor.as_mut() {
            Some(cursor) => {
                cursor.index = cursor.index.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    /// Moves one item forward, stopping at the last of `len` items.
    pub fn step_next(&mut self, len: usize) -> bool {
        match self.cursor.as_mut() {
            Some(cursor) => {
                cursor.index = (cursor.index + 1).min(len.saturating_sub(1));
                true
            }
            None => false,
        }
    }

    pub fn add_to_cart(&mut self, item: Item) {
        self.cart.push(item);
    }

    /// Enters address collection for the current shop and returns the cart total.
    pub fn begin_checkout(&mut self) -> Result<Price, CheckoutError> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let shop_id = self
            .current_shop()
            .ok_or(CheckoutError::NoShop)?
            .to_string();
        self.checkout = CheckoutState::WaitingForAddress { shop_id };
        Ok(self.cart_total())
    }

    /// Closes a pending checkout: empties the cart and records the transaction id.
    ///
    /// Returns `None` when no checkout is waiting for an address.
    pub fn complete_checkout(&mut self, transaction_id: Uuid) -> Option<CompletedCheckout> {
        let CheckoutState::WaitingForAddress { shop_id } = std::mem::take(&mut self.checkout)
        else {
            return None;
        };
        self.last_transaction_id = Some(transaction_id);
        Some(CompletedCheckout {
            shop_id,
            transaction_id,
            items: std::mem::take(&mut self.cart),
        })
    }
}
