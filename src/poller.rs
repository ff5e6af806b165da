use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::chain::ChainSource;
use crate::config::Config;
use crate::detector::{CycleEvaluator, EvaluatorConfig};
use crate::error::Result;
use crate::fetcher::QuoteSource;
use crate::notify::render::{render_alert, render_cycle_error};
use crate::notify::{broadcast, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fewer than two closes; nothing evaluated.
    Skipped,
    Evaluated { alerts: usize, failed_deliveries: usize },
}

/// Background loop: fetch, evaluate, deliver, sleep, forever.
///
/// One cycle, including every notification send, finishes before the fixed
/// delay to the next one starts, so the evaluator is only ever touched here.
pub struct AlertPoller {
    symbol: String,
    interval: Duration,
    recipients: Vec<String>,
    notify_on_error: bool,
    display_utc_offset_minutes: i32,
    quotes: Box<dyn QuoteSource>,
    chain: Box<dyn ChainSource>,
    notifier: Box<dyn Notifier>,
    evaluator: CycleEvaluator,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
}

impl AlertPoller {
    pub fn new(
        cfg: &Config,
        quotes: Box<dyn QuoteSource>,
        chain: Box<dyn ChainSource>,
        notifier: Box<dyn Notifier>,
        recipients: Vec<String>,
        health: Arc<HealthState>,
        latency: Arc<LatencyStats>,
    ) -> Self {
        Self {
            symbol: cfg.symbol.clone(),
            interval: cfg.poll_interval(),
            recipients,
            notify_on_error: cfg.notify_on_error,
            display_utc_offset_minutes: cfg.display_utc_offset_minutes,
            quotes,
            chain,
            notifier,
            evaluator: CycleEvaluator::new(EvaluatorConfig::from_config(cfg)),
            health,
            latency,
        }
    }

    pub async fn run(mut self) {
        info!(
            symbol = %self.symbol,
            interval_secs = self.interval.as_secs(),
            recipients = self.recipients.len(),
            "[POLLER] started"
        );

        loop {
            let started = Instant::now();
            let result = self.run_cycle().await;
            self.record_outcome(result, now_ns()).await;
            self.latency.record(started.elapsed());
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One fetch-evaluate-deliver pass. A fetch error aborts before the
    /// evaluator runs, so its state stays as of the last good cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let closes = self.quotes.recent_closes(&self.symbol).await?;
        let underlying = match closes.as_slice() {
            [.., _, last] => *last,
            _ => {
                debug!(closes = closes.len(), "[POLLER] not enough price history, skipping cycle");
                return Ok(CycleOutcome::Skipped);
            }
        };

        let chain = self.chain.snapshot(underlying).await?;
        let alerts = self.evaluator.evaluate_history(&closes, &chain, now_ns());

        let mut failed_deliveries = 0;
        for alert in &alerts {
            info!(
                event = "ALERT",
                key = %alert.key,
                lots = alert.lots,
                oi_change = alert.oi_change,
                price = alert.underlying_price,
                "ALERT | {}",
                alert.title,
            );
            let body = render_alert(alert, self.display_utc_offset_minutes);
            failed_deliveries += broadcast(self.notifier.as_ref(), &self.recipients, &body).await;
        }

        Ok(CycleOutcome::Evaluated {
            alerts: alerts.len(),
            failed_deliveries,
        })
    }

    /// Books a finished cycle on the health surface. A failed cycle is also
    /// broadcast as a status message when `NOTIFY_ON_ERROR` is set.
    async fn record_outcome(&self, result: Result<CycleOutcome>, at_ns: u64) {
        match result {
            Ok(CycleOutcome::Skipped) => self.health.record_skipped(at_ns),
            Ok(CycleOutcome::Evaluated { alerts, failed_deliveries }) => {
                self.health
                    .record_evaluated(alerts as u64, failed_deliveries as u64, at_ns);
                debug!(
                    alerts,
                    failed_deliveries,
                    previous_oi = ?self.evaluator.previous_oi(),
                    remembered_keys = self.evaluator.dedup().len(),
                    "[POLLER] cycle complete"
                );
            }
            Err(e) => {
                error!("[POLLER] cycle failed: {e}");
                self.health.record_failed(at_ns);
                if self.notify_on_error {
                    let body =
                        render_cycle_error(&e.to_string(), at_ns, self.display_utc_offset_minutes);
                    broadcast(self.notifier.as_ref(), &self.recipients, &body).await;
                }
            }
        }
    }

    #[cfg(test)]
    pub fn evaluator(&self) -> &CycleEvaluator {
        &self.evaluator
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::types::{ChainSnapshot, OptionLeg};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::num::NonZeroU64;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedQuotes {
        responses: Mutex<VecDeque<Result<Vec<f64>>>>,
    }

    #[async_trait]
    impl QuoteSource for ScriptedQuotes {
        async fn recent_closes(&self, _symbol: &str) -> Result<Vec<f64>> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct FixedChain {
        snapshot: ChainSnapshot,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChainSource for FixedChain {
        async fn snapshot(&mut self, _underlying: f64) -> Result<ChainSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.snapshot)
        }
    }

    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<(String, String)>>>,
        fail_for: Option<&'static str>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn deliver(&self, recipient: &str, body: &str) -> Result<()> {
            if self.fail_for == Some(recipient) {
                return Err(AppError::Notify("blocked by user".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn config() -> Config {
        Config {
            log_level: "debug".to_string(),
            api_port: 0,
            symbol: "CL=F".to_string(),
            lot_size: NonZeroU64::new(1000).unwrap(),
            poll_interval_secs: 180,
            dedup_capacity: 100,
            future_min_price_pct: 0.4,
            quote_api_url: String::new(),
            quote_range: "2d".to_string(),
            quote_interval: "5m".to_string(),
            telegram_api_url: String::new(),
            telegram_bot_token: None,
            chat_ids: Vec::new(),
            notify_on_error: false,
            display_utc_offset_minutes: 330,
        }
    }

    /// ITM call buy of 160 lots against an underlying of 72.50.
    fn qualifying_chain() -> ChainSnapshot {
        ChainSnapshot {
            call: OptionLeg { strike: 72.0, oi_change: 160_000, iv_roc: 3.0, option_price: 1.1 },
            put: OptionLeg { strike: 72.0, oi_change: -300_000, iv_roc: -2.0, option_price: 0.6 },
            future_oi_change: 0,
            open_interest: 9_000_000,
        }
    }

    struct Harness {
        poller: AlertPoller,
        sent: Arc<Mutex<Vec<(String, String)>>>,
        chain_calls: Arc<AtomicUsize>,
        health: Arc<HealthState>,
    }

    fn harness(quotes: Vec<Result<Vec<f64>>>, fail_for: Option<&'static str>) -> Harness {
        harness_with(config(), quotes, fail_for)
    }

    fn harness_with(
        cfg: Config,
        quotes: Vec<Result<Vec<f64>>>,
        fail_for: Option<&'static str>,
    ) -> Harness {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let chain_calls = Arc::new(AtomicUsize::new(0));
        let health = Arc::new(HealthState::new());
        let poller = AlertPoller::new(
            &cfg,
            Box::new(ScriptedQuotes { responses: Mutex::new(quotes.into()) }),
            Box::new(FixedChain { snapshot: qualifying_chain(), calls: Arc::clone(&chain_calls) }),
            Box::new(RecordingNotifier { sent: Arc::clone(&sent), fail_for }),
            vec!["111".to_string(), "222".to_string()],
            Arc::clone(&health),
            Arc::new(LatencyStats::new()),
        );
        Harness { poller, sent, chain_calls, health }
    }

    #[tokio::test]
    async fn alert_goes_to_every_recipient_once() {
        let mut h = harness(vec![Ok(vec![72.4, 72.5]), Ok(vec![72.4, 72.5])], None);

        let first = h.poller.run_cycle().await.unwrap();
        assert_eq!(first, CycleOutcome::Evaluated { alerts: 1, failed_deliveries: 0 });
        {
            let sent = h.sent.lock().unwrap();
            assert_eq!(sent.len(), 2);
            assert_eq!(sent[0].0, "111");
            assert_eq!(sent[1].0, "222");
            assert!(sent[0].1.contains("CALL BUY"));
        }

        let second = h.poller.run_cycle().await.unwrap();
        assert_eq!(second, CycleOutcome::Evaluated { alerts: 0, failed_deliveries: 0 });
        assert_eq!(h.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn short_history_skips_without_touching_state() {
        let mut h = harness(vec![Ok(vec![72.5])], None);

        assert_eq!(h.poller.run_cycle().await.unwrap(), CycleOutcome::Skipped);
        assert_eq!(h.chain_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.poller.evaluator().previous_oi(), None);
        assert!(h.poller.evaluator().dedup().is_empty());
    }

    #[tokio::test]
    async fn quote_failure_aborts_cycle() {
        let mut h = harness(vec![Err(AppError::Quote("boom".to_string()))], None);

        assert!(h.poller.run_cycle().await.is_err());
        assert_eq!(h.chain_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.poller.evaluator().previous_oi(), None);
        assert!(h.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_delivery_still_counts_as_sent() {
        let mut h = harness(vec![Ok(vec![72.4, 72.5]), Ok(vec![72.4, 72.5])], Some("111"));

        let first = h.poller.run_cycle().await.unwrap();
        assert_eq!(first, CycleOutcome::Evaluated { alerts: 1, failed_deliveries: 1 });
        assert_eq!(h.sent.lock().unwrap().len(), 1);

        // No redelivery on the next cycle.
        let second = h.poller.run_cycle().await.unwrap();
        assert_eq!(second, CycleOutcome::Evaluated { alerts: 0, failed_deliveries: 0 });
        assert_eq!(h.poller.evaluator().previous_oi(), Some(9_000_000));
    }

    async fn cycle_and_record(h: &mut Harness, at_ns: u64) {
        let result = h.poller.run_cycle().await;
        h.poller.record_outcome(result, at_ns).await;
    }

    #[tokio::test]
    async fn each_outcome_lands_on_its_own_counter() {
        let mut h = harness(
            vec![
                Ok(vec![72.5]),
                Ok(vec![72.4, 72.5]),
                Err(AppError::Quote("no data".to_string())),
            ],
            Some("222"),
        );

        cycle_and_record(&mut h, 10).await;
        assert_eq!(h.health.cycles_skipped(), 1);
        assert_eq!(h.health.last_cycle_at_ns(), 10);

        cycle_and_record(&mut h, 20).await;
        assert_eq!(h.health.cycles_evaluated(), 1);
        assert_eq!(h.health.alerts_fired(), 1);
        assert_eq!(h.health.deliveries_failed(), 1);
        assert_eq!(h.health.last_cycle_at_ns(), 20);

        cycle_and_record(&mut h, 30).await;
        assert_eq!(h.health.cycles_failed(), 1);
        assert_eq!(h.health.last_cycle_at_ns(), 30);

        assert_eq!(h.health.cycles_skipped(), 1);
        assert_eq!(h.health.cycles_evaluated(), 1);
    }

    #[tokio::test]
    async fn failed_cycle_is_announced_when_enabled() {
        let mut cfg = config();
        cfg.notify_on_error = true;
        let mut h = harness_with(cfg, vec![Err(AppError::Quote("<no chart>".to_string()))], None);

        cycle_and_record(&mut h, 0).await;

        let sent = h.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "111");
        assert_eq!(sent[1].0, "222");
        assert!(sent[0].1.starts_with("<b>Monitor error</b>"));
        assert!(sent[0].1.contains("&lt;no chart&gt;"));
        assert_eq!(h.health.cycles_failed(), 1);
    }

    #[tokio::test]
    async fn failed_cycle_is_silent_by_default() {
        let mut h = harness(vec![Err(AppError::Quote("no data".to_string()))], None);

        cycle_and_record(&mut h, 0).await;

        assert!(h.sent.lock().unwrap().is_empty());
        assert_eq!(h.health.cycles_failed(), 1);
    }

    #[tokio::test]
    async fn skipped_cycle_sends_nothing_even_with_error_notices_on() {
        let mut cfg = config();
        cfg.notify_on_error = true;
        let mut h = harness_with(cfg, vec![Ok(vec![72.5])], None);

        cycle_and_record(&mut h, 0).await;

        assert!(h.sent.lock().unwrap().is_empty());
        assert_eq!(h.health.cycles_skipped(), 1);
        assert_eq!(h.health.cycles_failed(), 0);
    }
}
