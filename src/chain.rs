use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::types::{ChainSnapshot, OptionLeg};

/// Source of per-cycle option OI data around the current underlying price.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn snapshot(&mut self, underlying: f64) -> Result<ChainSnapshot>;
}

const OI_CHANGE_RANGE: std::ops::RangeInclusive<i64> = -800_000..=1_200_000;
const BASE_OI_RANGE: std::ops::RangeInclusive<i64> = 5_000_000..=15_000_000;
const IV_ROC_RANGE: std::ops::RangeInclusive<f64> = -15.0..=25.0;
const OPTION_PRICE_RANGE: std::ops::RangeInclusive<f64> = 0.50..=5.00;

/// Random-walk option chain for a market without a live OI feed.
///
/// Watches the strike nearest the underlying on a 0.5 grid. Combined OI
/// starts from a random base and accumulates each snapshot's net change.
pub struct SimulatedChain {
    rng: StdRng,
    open_interest: Option<i64>,
}

impl SimulatedChain {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            open_interest: None,
        }
    }

    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            open_interest: None,
        }
    }

    fn leg(&mut self, strike: f64) -> OptionLeg {
        OptionLeg {
            strike,
            oi_change: self.rng.gen_range(OI_CHANGE_RANGE),
            iv_roc: round_to(self.rng.gen_range(IV_ROC_RANGE), 1),
            option_price: round_to(self.rng.gen_range(OPTION_PRICE_RANGE), 2),
        }
    }
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainSource for SimulatedChain {
    async fn snapshot(&mut self, underlying: f64) -> Result<ChainSnapshot> {
        let strike = nearest_half(underlying);
        let call = self.leg(strike);
        let put = self.leg(strike);
        let future_oi_change = call.oi_change + put.oi_change;

        let base = match self.open_interest {
            Some(oi) => oi,
            None => self.rng.gen_range(BASE_OI_RANGE),
        };
        let open_interest = base + future_oi_change;
        self.open_interest = Some(open_interest);

        Ok(ChainSnapshot {
            call,
            put,
            future_oi_change,
            open_interest,
        })
    }
}

/// Rounds to the nearest 0.5 strike.
pub fn nearest_half(price: f64) -> f64 {
    (price * 2.0).round() / 2.0
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}
