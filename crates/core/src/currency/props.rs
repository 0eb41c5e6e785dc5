//! Property-based tests for rounding and conversion.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::conversion::{convert_amount, round2};

/// Strategy to generate positive amounts with up to 6 decimals.
fn fine_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000_000i64).prop_map(|v| Decimal::new(v, 6))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Rounded values never carry more than two decimals.
    #[test]
    fn prop_round2_has_two_decimals(value in fine_amount()) {
        let rounded = round2(value);
        prop_assert_eq!(rounded, rounded.trunc_with_scale(2));
    }

    /// Rounding moves a value by at most half a cent.
    #[test]
    fn prop_round2_within_half_cent(value in fine_amount()) {
        let diff = (round2(value) - value).abs();
        prop_assert!(diff <= Decimal::new(5, 3), "{} moved by {}", value, diff);
    }

    /// Rounding is idempotent.
    #[test]
    fn prop_round2_idempotent(value in fine_amount()) {
        prop_assert_eq!(round2(round2(value)), round2(value));
    }

    /// A unit rate only rounds the amount.
    #[test]
    fn prop_unit_rate_preserves_amount(value in fine_amount()) {
        prop_assert_eq!(convert_amount(value, Decimal::ONE), round2(value));
    }

    /// Conversion is monotonic in the amount.
    #[test]
    fn prop_convert_monotonic(
        a in fine_amount(),
        b in fine_amount(),
        rate in positive_rate(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(convert_amount(lo, rate) <= convert_amount(hi, rate));
    }
}
