//! Currency conversion and rounding.
//!
//! Rounding policy for every monetary value:
//! - Round to two decimal places
//! - Use half-up rounding (midpoint away from zero)

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Decimal places of every stored amount.
pub const MONEY_DP: u32 = 2;

/// Rounds a monetary value to two decimals, half-up.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an amount using the given exchange rate.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal) -> Decimal {
    round2(amount * rate)
}
