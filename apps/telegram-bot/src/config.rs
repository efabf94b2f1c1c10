//! Process configuration for the Telegram front end.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_CATALOG_PATH: &str = "catalog.yaml";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub api_base: String,
    pub catalog_path: PathBuf,
    pub poll_timeout: Duration,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("catalog_path", &self.catalog_path)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .context("TELEGRAM_BOT_TOKEN environment variable required")?;
        let api_base = lookup("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into());
        let catalog_path = lookup("SHOP_CATALOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));
        let poll_timeout = match lookup("TELEGRAM_POLL_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("TELEGRAM_POLL_TIMEOUT_SECS={raw:?} is not a number"))?;
                if secs > 50 {
                    bail!("TELEGRAM_POLL_TIMEOUT_SECS must be at most 50, got {secs}");
                }
                secs
            }
            None => DEFAULT_POLL_TIMEOUT_SECS,
        };

        Ok(Self {
            bot_token,
            api_base,
            catalog_path,
            poll_timeout: Duration::from_secs(poll_timeout),
        })
    }
}
