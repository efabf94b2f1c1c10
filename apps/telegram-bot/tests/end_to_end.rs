use std::time::Duration;

use mock_telegram::MockBotApi;
use serde_json::{Value, json};
use shopbot_core::testkit::demo_catalog;
use shopbot_telegram::{BotConfig, Poller, build_poller};
use tokio::net::TcpListener;

const TOKEN: &str = "123:test";
const SHOPPER: i64 = 501;

struct Bot {
    api: MockBotApi,
    poller: Poller,
    offset: Option<i64>,
}

impl Bot {
    async fn start() -> Self {
        let api = MockBotApi::new();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = api.router();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = BotConfig {
            bot_token: TOKEN.into(),
            api_base: format!("http://{addr}"),
            catalog_path: "unused.yaml".into(),
            poll_timeout: Duration::ZERO,
        };
        let poller = build_poller(&config, demo_catalog()).unwrap();
        Self {
            api,
            poller,
            offset: None,
        }
    }

    async fn deliver(&mut self, update: Value) {
        self.api.push_update(update);
        self.offset = self.poller.poll_once(self.offset).await.unwrap();
    }

    async fn say(&mut self, text: &str) {
        self.deliver(json!({
            "message": {
                "message_id": 1,
                "chat": {"id": SHOPPER},
                "from": {"id": SHOPPER},
                "text": text
            }
        }))
        .await;
    }

    async fn press(&mut self, data: &str, message_id: i64) {
        self.deliver(json!({
            "callback_query": {
                "id": format!("cb-{data}"),
                "from": {"id": SHOPPER},
                "message": {"message_id": message_id, "chat": {"id": SHOPPER}},
                "data": data
            }
        }))
        .await;
    }

    fn texts_to(&self, chat: Value) -> Vec<String> {
        self.api
            .calls_to("sendMessage")
            .into_iter()
            .filter(|payload| payload["chat_id"] == chat)
            .filter_map(|payload| payload["text"].as_str().map(str::to_string))
            .collect()
    }
}

#[tokio::test]
async fn shopper_buys_two_items_over_the_bot_api() {
    let mut bot = Bot::start().await;

    bot.say("/start").await;
    bot.say("/shop demo").await;
    let photos = bot.api.calls_to("sendPhoto");
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0]["chat_id"], json!(SHOPPER));
    assert_eq!(photos[0]["parse_mode"], "Markdown");
    assert!(photos[0]["caption"].as_str().unwrap().starts_with("*Mug*"));
    assert_eq!(
        photos[0]["reply_markup"]["inline_keyboard"][1][0]["callback_data"],
        "add_to_cart"
    );

    // The mock numbers sent messages from 1; the photo follows the welcome text.
    let card = 2;
    bot.press("add_to_cart", card).await;
    bot.press("next", card).await;
    bot.press("add_to_cart", card).await;
    bot.press("checkout", card).await;
    bot.say("1 Main St").await;

    // Every press that changes the card re-renders it in place.
    let edits = bot.api.calls_to("editMessageMedia");
    assert_eq!(edits.len(), 3);
    assert!(edits.iter().all(|edit| edit["message_id"] == json!(card)));
    assert!(
        edits[1]["media"]["caption"]
            .as_str()
            .unwrap()
            .starts_with("*Shirt*")
    );
    assert_eq!(bot.api.calls_to("answerCallbackQuery").len(), 4);

    let shopper = bot.texts_to(json!(SHOPPER));
    assert_eq!(
        shopper[..4],
        [
            "Welcome to the shop bot! Use /shop <shop_id> to view items.".to_string(),
            "Added Mug to your cart!".to_string(),
            "Added Shirt to your cart!".to_string(),
            "Your cart contains:\n\nMug - $10\nShirt - $25\n\nTotal: $35\n\nPlease enter your delivery address:"
                .to_string(),
        ]
    );
    let receipt = &shopper[4];
    assert!(receipt.starts_with("Thank you for your order!\n\nTransaction ID: "));
    assert!(receipt.ends_with("Total: $35\n\nDelivery Address: 1 Main St"));

    let owner = bot.texts_to(json!("owner-1"));
    assert_eq!(owner.len(), 1);
    assert!(owner[0].starts_with("New order!"));

    let calls = bot.api.calls();
    assert!(calls.iter().all(|call| call.token == TOKEN));
}

#[tokio::test]
async fn exit_replaces_the_caption_without_controls() {
    let mut bot = Bot::start().await;
    bot.say("/shop demo").await;
    bot.press("exit", 1).await;

    let edits = bot.api.calls_to("editMessageCaption");
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0]["caption"], "Thank you for shopping with us!");
    assert!(edits[0].get("reply_markup").is_none());
}

#[tokio::test]
async fn unchanged_edit_is_not_an_error() {
    let mut bot = Bot::start().await;
    bot.api.fail_method(
        "editMessageMedia",
        400,
        "Bad Request: message is not modified: specified new message content and reply markup are exactly the same",
    );
    bot.say("/shop demo").await;
    bot.press("back", 1).await;
    bot.press("add_to_cart", 1).await;

    assert_eq!(bot.api.calls_to("editMessageMedia").len(), 2);
    assert_eq!(bot.texts_to(json!(SHOPPER)), ["Added Mug to your cart!"]);
}

#[tokio::test]
async fn unknown_commands_and_stale_buttons_are_handled_quietly() {
    let mut bot = Bot::start().await;
    bot.say("/help").await;
    assert!(bot.api.calls_to("sendMessage").is_empty());

    bot.press("next", 9).await;
    assert_eq!(bot.api.calls_to("answerCallbackQuery").len(), 1);
    assert_eq!(
        bot.texts_to(json!(SHOPPER)),
        ["Please choose a shop first. Usage: /shop <shop_id>"]
    );
}

#[tokio::test]
async fn offsets_advance_past_handled_updates() {
    let mut bot = Bot::start().await;
    bot.say("/start").await;
    assert_eq!(bot.offset, Some(2));
    bot.offset = bot.poller.poll_once(bot.offset).await.unwrap();
    assert_eq!(bot.offset, Some(2));
    assert_eq!(bot.api.calls_to("sendMessage").len(), 1);
}
