mod api;
mod chain;
mod config;
mod detector;
mod error;
mod fetcher;
mod notify;
mod poller;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::chain::SimulatedChain;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::YahooQuoteSource;
use crate::notify::{LogNotifier, Notifier, TelegramNotifier};
use crate::poller::AlertPoller;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!(
        symbol = %cfg.symbol,
        lot_size = cfg.lot_size.get(),
        interval_secs = cfg.poll_interval_secs,
        dedup_capacity = cfg.dedup_capacity,
        "Starting OI spike alerter for {} (lot size {}, every {}s)",
        cfg.symbol,
        cfg.lot_size,
        cfg.poll_interval_secs,
    );

    // --- Notification sink ---
    let (notifier, recipients): (Box<dyn Notifier>, Vec<String>) =
        match (&cfg.telegram_bot_token, cfg.chat_ids.is_empty()) {
            (Some(token), false) => {
                info!("[NOTIFY] Telegram delivery to {} recipient(s)", cfg.chat_ids.len());
                (Box::new(TelegramNotifier::new(&cfg, token)?) as Box<dyn Notifier>, cfg.chat_ids.clone())
            }
            _ => {
                warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set; alerts will only be logged");
                (Box::new(LogNotifier) as Box<dyn Notifier>, vec!["log".to_string()])
            }
        };

    // --- Shared health surface ---
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());

    // --- Poller (owns the evaluator) ---
    let poller = AlertPoller::new(
        &cfg,
        Box::new(YahooQuoteSource::new(&cfg)?),
        Box::new(SimulatedChain::new()),
        notifier,
        recipients,
        Arc::clone(&health),
        Arc::clone(&latency),
    );
    tokio::spawn(async move { poller.run().await });

    // --- HTTP health server ---
    let api_state = ApiState {
        health,
        latency,
        symbol: cfg.symbol.clone(),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP health endpoint listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
