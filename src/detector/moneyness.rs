use crate::config::price_tolerances::ATM_TOLERANCE;
use crate::types::{Moneyness, OptionType};

/// Absorbs representation noise at the band edge: 72.1 - 72.0 evaluates to
/// 0.0999999999999943, which must still count as a full 0.1.
const FLOAT_NOISE: f64 = 1e-9;

/// Classify a strike against the underlying for one option side.
///
/// ATM is checked first: `|strike - underlying| < 0.1`. Otherwise a call is
/// ITM when the strike is below the underlying, a put when it is above.
pub fn classify(strike: f64, underlying: f64, side: OptionType) -> Moneyness {
    let diff = strike - underlying;
    if diff.abs() < ATM_TOLERANCE - FLOAT_NOISE {
        return Moneyness::Atm;
    }
    let in_the_money = match side {
        OptionType::Call => diff < 0.0,
        OptionType::Put => diff > 0.0,
    };
    if in_the_money {
        Moneyness::Itm
    } else {
        Moneyness::Otm
    }
}
