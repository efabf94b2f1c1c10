//! User-facing text and item cards.

use shopbot_catalog::{Item, Price};
use uuid::Uuid;

use crate::event::Action;
use crate::transport::{Button, ItemCard, Keyboard};

pub const WELCOME: &str = "Welcome to the shop bot! Use /shop <shop_id> to view items.";
pub const SHOP_USAGE: &str = "Please provide a shop ID. Usage: /shop <shop_id>";
pub const SHOP_NOT_FOUND: &str = "Shop not found. Please try again with a valid shop ID.";
pub const NO_ITEMS: &str = "No more items in this shop.";
pub const CART_EMPTY: &str = "Your cart is empty. Add some items before checking out.";
pub const FAREWELL: &str = "Thank you for shopping with us!";
pub const NO_SHOP_SELECTED: &str = "Please choose a shop first. Usage: /shop <shop_id>";

/// Formats amounts with the catalog's currency prefix.
#[derive(Debug, Clone)]
pub struct Renderer {
    currency: String,
}

impl Renderer {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn amount(&self, price: Price) -> String {
        format!("{}{}", self.currency, price)
    }

    pub fn item_card(&self, item: &Item) -> ItemCard {
        ItemCard {
            image: item.image.clone(),
            caption: format!(
                "*{}*\n*Type*: {}\n*Price: {}*",
                escape_markdown(&item.name),
                escape_markdown(&item.tag),
                escape_markdown(&self.amount(item.price))
            ),
            controls: controls(),
        }
    }

    pub fn added_to_cart(&self, item: &Item) -> String {
        format!("Added {} to your cart!", item.name)
    }

    pub fn cart_lines(&self, items: &[Item]) -> String {
        items
            .iter()
            .map(|item| format!("{} - {}", item.name, self.amount(item.price)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn checkout_summary(&self, items: &[Item], total: Price) -> String {
        format!(
            "Your cart contains:\n\n{}\n\nTotal: {}\n\nPlease enter your delivery address:",
            self.cart_lines(items),
            self.amount(total)
        )
    }

    pub fn owner_notice(&self, order: &Order) -> String {
        self.order_text("New order!", order)
    }

    pub fn receipt(&self, order: &Order) -> String {
        self.order_text("Thank you for your order!", order)
    }

    fn order_text(&self, heading: &str, order: &Order) -> String {
        format!(
            "{heading}\n\nTransaction ID: {}\n\nItems:\n{}\n\nTotal: {}\n\nDelivery Address: {}",
            order.transaction_id,
            self.cart_lines(&order.items),
            self.amount(order.total()),
            order.address
        )
    }
}

/// A submitted order; only ever rendered into messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub transaction_id: Uuid,
    pub items: Vec<Item>,
    pub address: String,
}

impl Order {
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }
}

/// Back/Next, Add to Cart/Checkout, Exit.
pub fn controls() -> Keyboard {
    let button = |label: &str, action| Button {
        label: label.to_string(),
        action,
    };
    vec![
        vec![
            button("⬅️ Back", Action::Back),
            button("➡️ Next", Action::Next),
        ],
        vec![
            button("🛒 Add to Cart", Action::AddToCart),
            button("💳 Checkout", Action::Checkout),
        ],
        vec![button("❌ Exit", Action::Exit)],
    ]
}

/// Escapes the entities of Telegram's legacy Markdown.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
