use std::num::NonZeroU64;

use crate::config::lot_thresholds::{EXTREME, HIGH, SUPER_EXTREME, SUPER_HIGH};
use crate::types::SeverityLevel;

/// Lot-count thresholds mapped to severity, stored highest threshold first.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdTable {
    bands: &'static [(u64, SeverityLevel)],
}

/// Buying only alerts on the two top bands.
pub const BUY_TABLE: ThresholdTable = ThresholdTable {
    bands: &[
        (SUPER_EXTREME, SeverityLevel::SuperExtreme),
        (EXTREME, SeverityLevel::Extreme),
    ],
};

/// Writing (and the future leg) alert from the High band up.
pub const WRITE_TABLE: ThresholdTable = ThresholdTable {
    bands: &[
        (SUPER_EXTREME, SeverityLevel::SuperExtreme),
        (EXTREME, SeverityLevel::Extreme),
        (SUPER_HIGH, SeverityLevel::SuperHigh),
        (HIGH, SeverityLevel::High),
    ],
};

impl ThresholdTable {
    /// Highest band whose threshold `lots` meets or exceeds.
    pub fn resolve(&self, lots: u64) -> Option<SeverityLevel> {
        self.bands
            .iter()
            .find(|(threshold, _)| lots >= *threshold)
            .map(|&(_, level)| level)
    }

    /// Smallest lot count that resolves to any band.
    pub fn min_threshold(&self) -> u64 {
        self.bands.iter().map(|&(t, _)| t).min().unwrap_or(u64::MAX)
    }
}

/// `floor(|oi_change| / lot_size)`.
pub fn lots_from_delta(oi_change: i64, lot_size: NonZeroU64) -> u64 {
    oi_change.unsigned_abs() / lot_size.get()
}

pub fn classify_buy(lots: u64) -> Option<SeverityLevel> {
    BUY_TABLE.resolve(lots)
}

pub fn classify_write(lots: u64) -> Option<SeverityLevel> {
    WRITE_TABLE.resolve(lots)
}
