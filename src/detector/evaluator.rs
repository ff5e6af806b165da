use std::num::NonZeroU64;

use tracing::{debug, info};

use crate::config::Config;
use crate::detector::dedup::AlertDeduplicator;
use crate::detector::levels::{classify_buy, classify_write, lots_from_delta, BUY_TABLE, WRITE_TABLE};
use crate::detector::{activity, moneyness};
use crate::types::{
    AlertEvent, AlertKey, AlertLeg, ChainSnapshot, FutureDirection, MarketSample, OptionType,
    TradeSide,
};

/// Per-instrument knobs for one evaluator.
#[derive(Debug, Clone, Copy)]
pub struct EvaluatorConfig {
    pub lot_size: NonZeroU64,
    pub dedup_capacity: usize,
    pub future_min_price_pct: f64,
}

impl EvaluatorConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            lot_size: cfg.lot_size,
            dedup_capacity: cfg.dedup_capacity,
            future_min_price_pct: cfg.future_min_price_pct,
        }
    }
}

/// Turns one polling sample into the alerts that should go out.
///
/// Owns the only cross-cycle state (previous combined OI and the dedup set).
/// It is driven by a single poller; a host running several pollers against
/// one evaluator must put it behind a lock.
pub struct CycleEvaluator {
    cfg: EvaluatorConfig,
    previous_oi: Option<i64>,
    dedup: AlertDeduplicator,
}

impl CycleEvaluator {
    pub fn new(cfg: EvaluatorConfig) -> Self {
        Self {
            cfg,
            previous_oi: None,
            dedup: AlertDeduplicator::new(cfg.dedup_capacity),
        }
    }

    pub fn previous_oi(&self) -> Option<i64> {
        self.previous_oi
    }

    pub fn dedup(&self) -> &AlertDeduplicator {
        &self.dedup
    }

    /// Evaluates against a raw close history. Fewer than two closes is a
    /// no-op cycle: no alerts and no state change.
    pub fn evaluate_history(
        &mut self,
        closes: &[f64],
        chain: &ChainSnapshot,
        at_ns: u64,
    ) -> Vec<AlertEvent> {
        match MarketSample::from_history(closes, chain) {
            Some(sample) => self.evaluate(&sample, at_ns),
            None => {
                debug!(closes = closes.len(), "[EVALUATOR] insufficient price history, skipping");
                Vec::new()
            }
        }
    }

    /// Call leg, put leg, then future leg; output keeps that order.
    pub fn evaluate(&mut self, sample: &MarketSample, at_ns: u64) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();

        let candidates = [
            self.option_candidate(sample, OptionType::Call, at_ns),
            self.option_candidate(sample, OptionType::Put, at_ns),
            self.future_candidate(sample, at_ns),
        ];

        for candidate in candidates.into_iter().flatten() {
            if self.dedup.should_fire(&candidate.key) {
                alerts.push(candidate);
            } else {
                debug!(key = %candidate.key, "[EVALUATOR] suppressed repeat alert");
            }
        }

        let remembered = self.dedup.len();
        if self.dedup.maybe_clear() {
            info!(
                remembered,
                capacity = self.cfg.dedup_capacity,
                "[EVALUATOR] dedup set over capacity, cleared"
            );
        }

        self.previous_oi = Some(sample.open_interest);
        alerts
    }

    fn option_candidate(
        &self,
        sample: &MarketSample,
        option_type: OptionType,
        at_ns: u64,
    ) -> Option<AlertEvent> {
        let leg = sample.leg(option_type);
        let lots = lots_from_delta(leg.oi_change, self.cfg.lot_size);

        let moneyness = moneyness::classify(leg.strike, sample.underlying_price, option_type);
        if !moneyness.is_alertable() {
            return None;
        }

        let price_change = sample.price_change();
        let activity = activity::classify(leg.oi_change, leg.iv_roc, option_type, price_change);

        let (side, level) = if leg.oi_change > 0 && lots >= BUY_TABLE.min_threshold() {
            (TradeSide::Buy, classify_buy(lots)?)
        } else if leg.oi_change < 0 && lots >= WRITE_TABLE.min_threshold() {
            (TradeSide::Write, classify_write(lots)?)
        } else {
            return None;
        };

        Some(AlertEvent {
            title: format!("{} {side} → {level} ({moneyness})", option_type.name()),
            key: AlertKey::Option { side, level, option_type, moneyness },
            level,
            leg: AlertLeg::Option {
                option_type,
                side,
                strike: leg.strike,
                option_price: leg.option_price,
                iv_roc: leg.iv_roc,
                moneyness,
                activity,
            },
            oi_change: leg.oi_change,
            lots,
            oi_pct: self.oi_pct(leg.oi_change),
            underlying_price: sample.underlying_price,
            price_change,
            price_pct: sample.price_pct(),
            fired_at_ns: at_ns,
        })
    }

    /// Future leg always uses the write table, whatever the OI direction.
    fn future_candidate(&self, sample: &MarketSample, at_ns: u64) -> Option<AlertEvent> {
        let lots = lots_from_delta(sample.future_oi_change, self.cfg.lot_size);
        let level = classify_write(lots)?;

        let price_pct = sample.price_pct();
        if price_pct.abs() < self.cfg.future_min_price_pct {
            return None;
        }

        let price_change = sample.price_change();
        let direction = FutureDirection::from_price_change(price_change);

        Some(AlertEvent {
            title: format!("FUTURE {direction} → {level}"),
            key: AlertKey::Future { level, direction },
            level,
            leg: AlertLeg::Future { direction },
            oi_change: sample.future_oi_change,
            lots,
            oi_pct: self.oi_pct(sample.future_oi_change),
            underlying_price: sample.underlying_price,
            price_change,
            price_pct,
            fired_at_ns: at_ns,
        })
    }

    /// Percent of the previous cycle's combined OI; 0 without a usable base.
    fn oi_pct(&self, oi_change: i64) -> f64 {
        match self.previous_oi {
            Some(prev) if prev != 0 => oi_change as f64 / prev as f64 * 100.0,
            _ => 0.0,
        }
    }
}
