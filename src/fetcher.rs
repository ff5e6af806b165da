use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::{Config, QUOTE_HTTP_TIMEOUT_SECS};
use crate::error::{AppError, Result};

/// Source of recent periodic closes for the futures contract.
///
/// Returning fewer than two closes is not an error; the cycle just skips.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn recent_closes(&self, symbol: &str) -> Result<Vec<f64>>;
}

/// Reads intraday closes from the Yahoo Finance chart API.
pub struct YahooQuoteSource {
    client: reqwest::Client,
    base_url: String,
    range: String,
    interval: String,
}

impl YahooQuoteSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(QUOTE_HTTP_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (compatible; oi-spike-alerter)")
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.quote_api_url.trim_end_matches('/').to_string(),
            range: cfg.quote_range.clone(),
            interval: cfg.quote_interval.clone(),
        })
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    async fn recent_closes(&self, symbol: &str) -> Result<Vec<f64>> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url, symbol, self.range, self.interval
        );

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        // Yahoo reports bad symbols as JSON with a non-2xx status, so parse first.
        let body: Value = resp.json().await?;
        let closes = parse_chart_closes(&body)?;

        debug!(%symbol, %status, closes = closes.len(), "[QUOTES] chart fetched");
        Ok(closes)
    }
}

/// Extracts the close series from a chart API payload, oldest first.
/// Gaps (`null`) are dropped.
pub fn parse_chart_closes(v: &Value) -> Result<Vec<f64>> {
    if let Some(err) = v.pointer("/chart/error").filter(|e| !e.is_null()) {
        let desc = err
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown error");
        return Err(AppError::Quote(format!("chart API error: {desc}")));
    }

    let quote = v
        .pointer("/chart/result/0/indicators/quote/0")
        .ok_or_else(|| AppError::Quote("chart response has no quote series".to_string()))?;

    // An empty trading window comes back as `quote: [{}]`.
    let closes = quote
        .get("close")
        .and_then(|c| c.as_array())
        .map(|a| a.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();

    Ok(closes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn closes_skip_nulls() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "CL=F" },
                    "timestamp": [1, 2, 3, 4],
                    "indicators": { "quote": [{ "close": [72.1, null, 72.3, 72.5] }] }
                }],
                "error": null
            }
        });
        assert_eq!(parse_chart_closes(&body).unwrap(), vec![72.1, 72.3, 72.5]);
    }

    #[test]
    fn empty_window_is_not_an_error() {
        let body = json!({
            "chart": { "result": [{ "indicators": { "quote": [{}] } }], "error": null }
        });
        assert!(parse_chart_closes(&body).unwrap().is_empty());
    }

    #[test]
    fn api_error_is_surfaced() {
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        let err = parse_chart_closes(&body).unwrap_err();
        assert!(matches!(err, AppError::Quote(ref m) if m.contains("delisted")));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(matches!(
            parse_chart_closes(&json!({ "unexpected": true })),
            Err(AppError::Quote(_))
        ));
    }
}
