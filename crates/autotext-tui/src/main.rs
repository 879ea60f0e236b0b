mod action;
mod app;
mod app_state;
mod component;
mod components;
mod dispatch;
mod theme;
mod widgets;

use autotext_proto::client::ApiClient;
use autotext_proto::config::{Config, API_URL_ENV};
use autotext_proto::message_log::MessageLogClient;
use tokio::sync::mpsc;

use crate::dispatch::{Dispatcher, QueueEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = autotext_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("autotext.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // The dashboard owns the terminal, so say where the log goes before it does.
    eprintln!("autotext log: {}", log_path.display());

    tracing::info!("autotext starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config unreadable, using defaults: {}", e);
        Config::default().with_api_url_override(std::env::var(API_URL_ENV).ok())
    });
    tracing::info!("lead service: {}", config.api.base_url);

    // ── Clients ──────────────────────────────────────────────────────────────
    let client = ApiClient::new(&config.api)?;
    let message_log = if config.message_log.record_sends {
        tracing::info!("recording sends to {}", config.message_log.url);
        Some(MessageLogClient::new(&config.message_log.url)?)
    } else {
        None
    };

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let (queue_tx, queue_rx) = mpsc::channel::<QueueEvent>(256);
    let dispatcher = Dispatcher::new(client, message_log, queue_tx);
    let app = app::App::new(&config, dispatcher);
    app.run(queue_rx).await?;

    Ok(())
}
