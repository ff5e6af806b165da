pub mod render;
pub mod telegram;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;

pub use telegram::TelegramNotifier;

/// Delivers a pre-rendered message body to one recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, recipient: &str, body: &str) -> Result<()>;
}

/// Fallback when no bot token or chat ids are configured: alerts go to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, recipient: &str, body: &str) -> Result<()> {
        info!(%recipient, "[NOTIFY] {body}");
        Ok(())
    }
}

/// Sends `body` to every recipient in order. A failed send is logged and the
/// rest still go out. Returns how many sends failed.
pub async fn broadcast(notifier: &dyn Notifier, recipients: &[String], body: &str) -> usize {
    let mut failed = 0;
    for recipient in recipients {
        if let Err(e) = notifier.deliver(recipient, body).await {
            failed += 1;
            warn!(%recipient, "[NOTIFY] delivery failed: {e}");
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    struct FlakyNotifier {
        fail_for: &'static str,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn deliver(&self, recipient: &str, _body: &str) -> Result<()> {
            if recipient == self.fail_for {
                return Err(AppError::Notify("chat not found".to_string()));
            }
            self.delivered.lock().unwrap().push(recipient.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn one_bad_recipient_does_not_block_the_rest() {
        let n = FlakyNotifier { fail_for: "b", delivered: Mutex::new(Vec::new()) };
        let recipients = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let failed = broadcast(&n, &recipients, "hello").await;
        assert_eq!(failed, 1);
        assert_eq!(*n.delivered.lock().unwrap(), vec!["a".to_string(), "c".to_string()]);
    }
}
