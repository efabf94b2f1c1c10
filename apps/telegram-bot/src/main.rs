use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use shopbot_catalog::Catalog;
use shopbot_telegram::config::DEFAULT_CATALOG_PATH;
use shopbot_telegram::{BotConfig, build_poller};
use shopbot_telemetry::{TelemetryConfig, init_telemetry, telemetry_enabled};

#[derive(Parser, Debug)]
#[command(author, version, about = "Telegram storefront bot")]
struct Cli {
    /// Catalog YAML file; overrides SHOP_CATALOG
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Validate the catalog and exit without connecting to Telegram
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry(TelemetryConfig::from_env(
        "shopbot-telegram",
        env!("CARGO_PKG_VERSION"),
    ))?;

    if cli.check {
        let path = cli
            .catalog
            .or_else(|| std::env::var_os("SHOP_CATALOG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));
        let catalog = Catalog::load(&path)?;
        for shop_id in catalog.shop_ids() {
            let items = catalog.lookup(shop_id).map_or(0, |shop| shop.len());
            println!("{shop_id}: {items} item(s)");
        }
        println!("{} ok: {} shop(s)", path.display(), catalog.len());
        return Ok(());
    }

    let mut config = BotConfig::from_env()?;
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }
    let catalog = Catalog::load(&config.catalog_path)
        .with_context(|| format!("loading catalog for {config:?}"))?;
    tracing::info!(
        catalog = %config.catalog_path.display(),
        shops = catalog.len(),
        api_base = %config.api_base,
        otel = telemetry_enabled(),
        "shopbot-telegram starting"
    );

    let poller = build_poller(&config, catalog)?;
    poller
        .run(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await;
    Ok(())
}
