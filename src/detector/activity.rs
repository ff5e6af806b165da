use crate::config::price_tolerances::FAVOR_THRESHOLD;
use crate::types::{OptionType, WriterActivity};

/// True when the futures move is in the direction that helps this side.
fn price_favors(side: OptionType, price_change: f64) -> bool {
    match side {
        OptionType::Call => price_change > FAVOR_THRESHOLD,
        OptionType::Put => price_change < -FAVOR_THRESHOLD,
    }
}

/// Reads writer activity from OI direction, IV direction and price direction.
/// Zero OI change or zero IV-ROC count as falling.
pub fn classify(oi_change: i64, iv_roc: f64, side: OptionType, price_change: f64) -> WriterActivity {
    let oi_rising = oi_change > 0;
    let iv_rising = iv_roc > 0.0;
    let favors = price_favors(side, price_change);

    match (oi_rising, iv_rising, favors) {
        (true, true, true) => WriterActivity::HedgingForcedWriting,
        (true, true, false) => WriterActivity::AccumulationHighVolBuy,
        (true, false, true) => WriterActivity::FreshWriting,
        (true, false, false) => WriterActivity::AccumulationLowVolBuy,
        (false, true, true) => WriterActivity::Unwinding,
        (false, true, false) => WriterActivity::ForcedExitByBuyers,
        (false, false, true) => WriterActivity::ProfitBooking,
        (false, false, false) => WriterActivity::ProfitBookingByBuyers,
    }
}
