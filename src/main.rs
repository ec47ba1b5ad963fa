mod config;
mod detector;
mod error;
mod extractor;
mod fetch;
mod monitor;
mod notifier;
mod state;

use anyhow::Context;
use config::{Config, TelegramConfig};
use fetch::HttpFetcher;
use monitor::Monitor;
use notifier::TelegramNotifier;
use state::StateStore;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        PathBuf::from(std::env::var("CONFIG").unwrap_or_else(|_| "config.json".to_string()));
    let config = Config::load(&config_path).context("failed to load configuration")?;
    let telegram = TelegramConfig::from_env().context("telegram credentials are required")?;

    let fetcher = HttpFetcher::new(&config.user_agent, config.fetch_timeout())
        .context("failed to build HTTP client")?;
    let notify_client = reqwest::Client::builder()
        .timeout(config.fetch_timeout())
        .build()
        .context("failed to build Telegram client")?;

    let store = StateStore::new(&config.state_file);
    info!(
        "monitor started: {} every {}s, state in {} (Ctrl+C to stop)",
        config.url,
        config.scan_interval_secs,
        store.path().display()
    );

    let monitor = Monitor::new(
        config.url.clone(),
        Box::new(fetcher),
        store,
        Box::new(TelegramNotifier::new(notify_client, telegram)),
    );

    // first tick fires immediately; Ctrl+C ends the loop
    monitor
        .run_until(config.scan_interval(), tokio::signal::ctrl_c())
        .await;

    Ok(())
}
