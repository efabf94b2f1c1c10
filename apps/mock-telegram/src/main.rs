use anyhow::{Context, Result};
use mock_telegram::MockBotApi;
use shopbot_telemetry::{TelemetryConfig, init_telemetry};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(
        "mock-telegram",
        env!("CARGO_PKG_VERSION"),
    ))?;

    let bind = std::env::var("MOCK_TELEGRAM_BIND").unwrap_or_else(|_| "0.0.0.0:9081".into());
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    tracing::info!("mock-telegram listening on {}", listener.local_addr()?);

    let app = MockBotApi::new().router();
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}
