use std::num::NonZeroU64;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const QUOTE_API_URL: &str = "https://query1.finance.yahoo.com";
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Crude oil futures on NYMEX.
pub const DEFAULT_SYMBOL: &str = "CL=F";

/// Barrels per lot for the default contract. Other markets differ (e.g. 100).
pub const DEFAULT_LOT_SIZE: u64 = 1000;

/// Delay between the end of one polling cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 180;

/// Dedup set is wiped once it holds more keys than this.
pub const DEFAULT_DEDUP_CAPACITY: usize = 100;

/// Future-leg alerts need at least this absolute percent move.
pub const DEFAULT_FUTURE_MIN_PRICE_PCT: f64 = 0.4;

/// IST, the desk the alerts were written for.
pub const DEFAULT_DISPLAY_UTC_OFFSET_MINUTES: i32 = 330;

pub const QUOTE_HTTP_TIMEOUT_SECS: u64 = 30;
pub const NOTIFY_HTTP_TIMEOUT_SECS: u64 = 15;

/// Lot-count thresholds for severity bands.
pub mod lot_thresholds {
    pub const HIGH: u64 = 75;
    pub const SUPER_HIGH: u64 = 100;
    pub const EXTREME: u64 = 150;
    pub const SUPER_EXTREME: u64 = 200;
}

/// Moneyness and writer-activity tolerances, in underlying price units.
pub mod price_tolerances {
    /// |strike - underlying| strictly below this is at-the-money.
    pub const ATM_TOLERANCE: f64 = 0.1;
    /// A futures move beyond this favours the call (up) or put (down) side.
    pub const FAVOR_THRESHOLD: f64 = 0.05;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub api_port: u16,
    /// Futures symbol polled on the quote API (FUT_SYMBOL)
    pub symbol: String,
    /// Contract units per lot (LOT_SIZE)
    pub lot_size: NonZeroU64,
    /// Seconds between polling cycles (POLL_INTERVAL_SECS)
    pub poll_interval_secs: u64,
    /// Max remembered alert keys before the set is cleared (DEDUP_CAPACITY)
    pub dedup_capacity: usize,
    /// Minimum |price %| for a future-leg alert (FUTURE_MIN_PRICE_PCT)
    pub future_min_price_pct: f64,
    pub quote_api_url: String,
    /// Yahoo `range` query parameter (QUOTE_RANGE)
    pub quote_range: String,
    /// Yahoo `interval` query parameter (QUOTE_INTERVAL)
    pub quote_interval: String,
    pub telegram_api_url: String,
    pub telegram_bot_token: Option<String>,
    /// Recipients (TELEGRAM_CHAT_ID, comma-separated).
    pub chat_ids: Vec<String>,
    /// Send a status message when a cycle fails (NOTIFY_ON_ERROR)
    pub notify_on_error: bool,
    pub display_utc_offset_minutes: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let lot_size = std::env::var("LOT_SIZE")
            .unwrap_or_else(|_| DEFAULT_LOT_SIZE.to_string())
            .parse::<u64>()
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or_else(|| AppError::Config("LOT_SIZE must be a positive integer".to_string()))?;

        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            symbol: std::env::var("FUT_SYMBOL").unwrap_or_else(|_| DEFAULT_SYMBOL.to_string()),
            lot_size,
            poll_interval_secs: parse_poll_interval_secs(
                &std::env::var("POLL_INTERVAL_SECS")
                    .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_SECS.to_string()),
            )?,
            dedup_capacity: std::env::var("DEDUP_CAPACITY")
                .unwrap_or_else(|_| DEFAULT_DEDUP_CAPACITY.to_string())
                .parse::<usize>()
                .unwrap_or(DEFAULT_DEDUP_CAPACITY),
            future_min_price_pct: parse_future_min_price_pct(
                &std::env::var("FUTURE_MIN_PRICE_PCT")
                    .unwrap_or_else(|_| DEFAULT_FUTURE_MIN_PRICE_PCT.to_string()),
            )?,
            quote_api_url: std::env::var("QUOTE_API_URL")
                .unwrap_or_else(|_| QUOTE_API_URL.to_string()),
            quote_range: std::env::var("QUOTE_RANGE").unwrap_or_else(|_| "2d".to_string()),
            quote_interval: std::env::var("QUOTE_INTERVAL").unwrap_or_else(|_| "5m".to_string()),
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| TELEGRAM_API_URL.to_string()),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            chat_ids: parse_recipients(&std::env::var("TELEGRAM_CHAT_ID").unwrap_or_default()),
            notify_on_error: std::env::var("NOTIFY_ON_ERROR")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            display_utc_offset_minutes: std::env::var("DISPLAY_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| DEFAULT_DISPLAY_UTC_OFFSET_MINUTES.to_string())
                .parse::<i32>()
                .unwrap_or(DEFAULT_DISPLAY_UTC_OFFSET_MINUTES),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// A zero delay would poll the quote API back to back.
pub fn parse_poll_interval_secs(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|&secs| secs > 0)
        .ok_or_else(|| AppError::Config("POLL_INTERVAL_SECS must be a positive integer".to_string()))
}

/// NaN would silently disable the future-leg gate (`x < NaN` is false).
pub fn parse_future_min_price_pct(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|pct| pct.is_finite() && *pct >= 0.0)
        .ok_or_else(|| {
            AppError::Config("FUTURE_MIN_PRICE_PCT must be a finite, non-negative number".to_string())
        })
}

/// Splits a comma-delimited recipient list, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
