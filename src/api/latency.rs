//! In-memory histogram of polling cycle durations (fetch + evaluate + send).

use std::sync::Mutex;
use std::time::Duration;

/// Shared cycle timing. Poller records, API reads.
/// Values stored in milliseconds.
pub struct LatencyStats {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

impl LatencyStats {
    /// Tracks 1ms to 1h, 3 significant figures.
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 3_600_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    pub fn record(&self, d: Duration) {
        let ms = d.as_millis().clamp(1, 3_600_000) as u64;
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(ms);
        }
    }

    /// Return (p50_ms, p95_ms, p99_ms, max_ms). None if no samples.
    pub fn percentiles(&self) -> Option<(u64, u64, u64, u64)> {
        let h = self.inner.lock().ok()?;
        if h.len() == 0 {
            return None;
        }
        Some((
            h.value_at_quantile(0.5),
            h.value_at_quantile(0.95),
            h.value_at_quantile(0.99),
            h.max(),
        ))
    }

    /// Sample count.
    pub fn len(&self) -> u64 {
        self.inner.lock().map(|h| h.len()).unwrap_or(0)
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_percentiles() {
        let s = LatencyStats::new();
        assert!(s.percentiles().is_none());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn sub_millisecond_cycles_count_as_one() {
        let s = LatencyStats::new();
        s.record(Duration::from_micros(300));
        s.record(Duration::from_millis(1200));
        assert_eq!(s.len(), 2);
        let (p50, _, _, max) = s.percentiles().unwrap();
        assert_eq!(p50, 1);
        assert!((1199..=1201).contains(&max));
    }
}
