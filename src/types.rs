// ---------------------------------------------------------------------------
// Instrument sides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    /// CE
    Call,
    /// PE
    Put,
}

impl OptionType {
    /// Long-form name used in alert titles.
    pub fn name(self) -> &'static str {
        match self {
            OptionType::Call => "CALL",
            OptionType::Put => "PUT",
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OptionType::Call => "CE",
            OptionType::Put => "PE",
        };
        write!(f, "{s}")
    }
}

/// Option-leg transaction direction inferred from the OI delta sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSide {
    /// OI increase.
    Buy,
    /// OI decrease.
    Write,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Write => write!(f, "WRITE"),
        }
    }
}

/// Future-leg direction, taken from the sign of the price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FutureDirection {
    Buy,
    Sell,
}

impl FutureDirection {
    pub fn from_price_change(price_change: f64) -> Self {
        if price_change > 0.0 {
            FutureDirection::Buy
        } else {
            FutureDirection::Sell
        }
    }
}

impl std::fmt::Display for FutureDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FutureDirection::Buy => write!(f, "BUY"),
            FutureDirection::Sell => write!(f, "SELL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Moneyness {
    Itm,
    Atm,
    Otm,
}

impl Moneyness {
    /// Only in- and at-the-money legs are ever alerted on.
    pub fn is_alertable(self) -> bool {
        !matches!(self, Moneyness::Otm)
    }
}

impl std::fmt::Display for Moneyness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Moneyness::Itm => "ITM",
            Moneyness::Atm => "ATM",
            Moneyness::Otm => "OTM",
        };
        write!(f, "{s}")
    }
}

/// Severity bands, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityLevel {
    /// 75+ lots
    High,
    /// 100+ lots
    SuperHigh,
    /// 150+ lots
    Extreme,
    /// 200+ lots
    SuperExtreme,
}

impl SeverityLevel {
    pub fn label(self) -> &'static str {
        match self {
            SeverityLevel::High => "High Spike (75+)",
            SeverityLevel::SuperHigh => "Super High Spike (100+)",
            SeverityLevel::Extreme => "Extreme Spike (150+)",
            SeverityLevel::SuperExtreme => "Super Extreme Spike (200+)",
        }
    }
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Qualitative read of who is driving an option leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterActivity {
    HedgingForcedWriting,
    AccumulationHighVolBuy,
    FreshWriting,
    AccumulationLowVolBuy,
    Unwinding,
    ForcedExitByBuyers,
    ProfitBooking,
    ProfitBookingByBuyers,
}

impl WriterActivity {
    pub fn label(self) -> &'static str {
        match self {
            WriterActivity::HedgingForcedWriting => "Hedging / Forced Writing",
            WriterActivity::AccumulationHighVolBuy => "Strong Accumulation / High Volatility Buy",
            WriterActivity::FreshWriting => "Fresh Writing / Position Building",
            WriterActivity::AccumulationLowVolBuy => "Strong Accumulation / Low Volatility Buy",
            WriterActivity::Unwinding => "Unwinding / Position Exiting",
            WriterActivity::ForcedExitByBuyers => "Liquidation / Forced Exit by Buyers",
            WriterActivity::ProfitBooking => "Profit Booking / Minor Exit",
            WriterActivity::ProfitBookingByBuyers => "Profit Booking by Buyers / Low Volatility Exit",
        }
    }
}

impl std::fmt::Display for WriterActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Per-cycle inputs
// ---------------------------------------------------------------------------

/// One option leg of the monitored strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionLeg {
    pub strike: f64,
    /// Signed OI delta in contract units since the previous poll.
    pub oi_change: i64,
    /// Implied volatility rate of change, percent.
    pub iv_roc: f64,
    pub option_price: f64,
}

/// Option-chain half of a sample, as produced by a chain source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSnapshot {
    pub call: OptionLeg,
    pub put: OptionLeg,
    /// Combined OI delta used for the future-leg alert.
    pub future_oi_change: i64,
    /// Current combined open interest.
    pub open_interest: i64,
}

/// Everything one polling cycle evaluates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSample {
    pub underlying_price: f64,
    pub previous_close: f64,
    pub call_leg: OptionLeg,
    pub put_leg: OptionLeg,
    pub future_oi_change: i64,
    pub open_interest: i64,
}

impl MarketSample {
    /// Builds a sample from the last two closes. `None` when history is too short.
    pub fn from_history(closes: &[f64], chain: &ChainSnapshot) -> Option<Self> {
        let [.., previous_close, underlying_price] = closes else {
            return None;
        };
        Some(Self {
            underlying_price: *underlying_price,
            previous_close: *previous_close,
            call_leg: chain.call,
            put_leg: chain.put,
            future_oi_change: chain.future_oi_change,
            open_interest: chain.open_interest,
        })
    }

    pub fn price_change(&self) -> f64 {
        self.underlying_price - self.previous_close
    }

    /// Percent move against the previous close; 0 when that close is 0.
    pub fn price_pct(&self) -> f64 {
        if self.previous_close == 0.0 {
            0.0
        } else {
            self.price_change() / self.previous_close * 100.0
        }
    }

    pub fn leg(&self, option_type: OptionType) -> &OptionLeg {
        match option_type {
            OptionType::Call => &self.call_leg,
            OptionType::Put => &self.put_leg,
        }
    }
}

// ---------------------------------------------------------------------------
// Alert identity and payload
// ---------------------------------------------------------------------------

/// Deduplication identity of a fired alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKey {
    Option {
        side: TradeSide,
        level: SeverityLevel,
        option_type: OptionType,
        moneyness: Moneyness,
    },
    Future {
        level: SeverityLevel,
        direction: FutureDirection,
    },
}

impl std::fmt::Display for AlertKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKey::Option { side, level, option_type, moneyness } => {
                write!(f, "{side}|{level:?}|{option_type}|{moneyness}")
            }
            AlertKey::Future { level, direction } => write!(f, "FUT|{level:?}|{direction}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertLeg {
    Option {
        option_type: OptionType,
        side: TradeSide,
        strike: f64,
        option_price: f64,
        iv_roc: f64,
        moneyness: Moneyness,
        activity: WriterActivity,
    },
    Future {
        direction: FutureDirection,
    },
}

/// A fired alert with every field the renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub title: String,
    pub key: AlertKey,
    pub level: SeverityLevel,
    pub leg: AlertLeg,
    pub oi_change: i64,
    pub lots: u64,
    /// OI delta as a percent of the previous cycle's combined OI.
    pub oi_pct: f64,
    pub underlying_price: f64,
    pub price_change: f64,
    pub price_pct: f64,
    /// Nanosecond UTC epoch timestamp.
    pub fired_at_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> ChainSnapshot {
        let leg = OptionLeg { strike: 72.0, oi_change: 0, iv_roc: 0.0, option_price: 1.0 };
        ChainSnapshot { call: leg, put: leg, future_oi_change: 0, open_interest: 1_000_000 }
    }

    #[test]
    fn sample_uses_last_two_closes() {
        let s = MarketSample::from_history(&[70.0, 71.0, 72.5], &chain()).unwrap();
        assert_eq!(s.previous_close, 71.0);
        assert_eq!(s.underlying_price, 72.5);
        assert!((s.price_change() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn short_history_yields_no_sample() {
        assert!(MarketSample::from_history(&[], &chain()).is_none());
        assert!(MarketSample::from_history(&[72.0], &chain()).is_none());
    }

    #[test]
    fn zero_previous_close_gives_zero_pct() {
        let s = MarketSample::from_history(&[0.0, 72.5], &chain()).unwrap();
        assert_eq!(s.price_pct(), 0.0);
    }

    #[test]
    fn alert_keys_render_canonically() {
        let k = AlertKey::Option {
            side: TradeSide::Buy,
            level: SeverityLevel::Extreme,
            option_type: OptionType::Call,
            moneyness: Moneyness::Itm,
        };
        assert_eq!(k.to_string(), "BUY|Extreme|CE|ITM");
        let f = AlertKey::Future { level: SeverityLevel::High, direction: FutureDirection::Sell };
        assert_eq!(f.to_string(), "FUT|High|SELL");
    }
}
