use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, NOTIFY_HTTP_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::notify::Notifier;

/// Telegram Bot API `sendMessage` with HTML parse mode.
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(cfg: &Config, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(NOTIFY_HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: send_message_url(&cfg.telegram_api_url, token),
        })
    }
}

fn send_message_url(api_url: &str, token: &str) -> String {
    format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), token)
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, recipient: &str, body: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: recipient,
            text: body,
            parse_mode: "HTML",
        };

        let resp = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = resp.status();
        let api: ApiResponse = resp.json().await?;

        if !status.is_success() || !api.ok {
            let reason = api.description.unwrap_or_else(|| status.to_string());
            return Err(AppError::Notify(format!("telegram rejected message to {recipient}: {reason}")));
        }

        debug!(%recipient, "[NOTIFY] telegram message delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(
            send_message_url("https://api.telegram.org/", "123:abc"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn payload_shape() {
        let body = serde_json::to_value(SendMessage {
            chat_id: "-100",
            text: "<b>hi</b>",
            parse_mode: "HTML",
        })
        .unwrap();
        assert_eq!(body["chat_id"], "-100");
        assert_eq!(body["parse_mode"], "HTML");
    }

    #[test]
    fn error_response_parses() {
        let r: ApiResponse =
            serde_json::from_str(r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#)
                .unwrap();
        assert!(!r.ok);
        assert_eq!(r.description.as_deref(), Some("Bad Request: chat not found"));
    }
}
