//! Shared health counters for the /health endpoint.
//! Written by the poller after each cycle, read by the API. Never touches
//! evaluator state.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Cycles that fetched data and ran the evaluator.
    pub cycles_evaluated: AtomicU64,
    /// Cycles skipped for lack of price history.
    pub cycles_skipped: AtomicU64,
    /// Cycles aborted by a collaborator error.
    pub cycles_failed: AtomicU64,
    pub alerts_fired: AtomicU64,
    /// Individual sends that failed (per recipient).
    pub deliveries_failed: AtomicU64,
    /// Nanosecond timestamp of the last finished cycle of any kind (0 = none).
    pub last_cycle_at_ns: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_evaluated(&self, alerts: u64, failed_deliveries: u64, at_ns: u64) {
        self.cycles_evaluated.fetch_add(1, Ordering::Relaxed);
        self.alerts_fired.fetch_add(alerts, Ordering::Relaxed);
        self.deliveries_failed.fetch_add(failed_deliveries, Ordering::Relaxed);
        self.last_cycle_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn record_skipped(&self, at_ns: u64) {
        self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn record_failed(&self, at_ns: u64) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn cycles_evaluated(&self) -> u64 {
        self.cycles_evaluated.load(Ordering::Relaxed)
    }

    pub fn cycles_skipped(&self) -> u64 {
        self.cycles_skipped.load(Ordering::Relaxed)
    }

    pub fn cycles_failed(&self) -> u64 {
        self.cycles_failed.load(Ordering::Relaxed)
    }

    pub fn alerts_fired(&self) -> u64 {
        self.alerts_fired.load(Ordering::Relaxed)
    }

    pub fn deliveries_failed(&self) -> u64 {
        self.deliveries_failed.load(Ordering::Relaxed)
    }

    pub fn last_cycle_at_ns(&self) -> u64 {
        self.last_cycle_at_ns.load(Ordering::Relaxed)
    }
}
