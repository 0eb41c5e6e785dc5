//! Property-based tests for the amortization engine.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::engine::{generate_schedule, monthly_rate};
use crate::currency::round2;

/// Principal between 0.01 and 400,000.00.
fn principal() -> impl Strategy<Value = Decimal> {
    (1i64..=40_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Annual rate between 0.01% and 116.00%.
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..=11_600i64).prop_map(|bp| Decimal::new(bp, 2))
}

fn installment_count() -> impl Strategy<Value = u32> {
    1u32..=36
}

fn start_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=31).prop_map(|(y, m, d)| {
        // Clamp the day so every generated triple is a valid date.
        (1..=d)
            .rev()
            .find_map(|day| NaiveDate::from_ymd_opt(y, m, day))
            .unwrap_or_default()
    })
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Interest-free schedules reconcile exactly to the rounded principal.
    #[test]
    fn prop_flat_sum_equals_principal(
        p in principal(),
        n in installment_count(),
        start in start_date(),
    ) {
        let schedule = generate_schedule(p, Decimal::ZERO, n, start).unwrap();
        prop_assert_eq!(schedule.len(), n as usize);
        prop_assert_eq!(schedule.sum(), round2(p));
    }

    /// Interest-bearing schedules reconcile exactly to round2(payment * n).
    #[test]
    fn prop_french_sum_equals_theoretical_total(
        p in principal(),
        rate in positive_rate(),
        n in installment_count(),
        start in start_date(),
    ) {
        let schedule = generate_schedule(p, rate, n, start).unwrap();
        prop_assert_eq!(schedule.len(), n as usize);
        prop_assert_eq!(schedule.sum(), schedule.total);
        prop_assert_eq!(schedule.total, round2(schedule.payment * Decimal::from(n)));
    }

    /// Every amount is already rounded to cents.
    #[test]
    fn prop_amounts_are_cents(
        p in principal(),
        rate in prop_oneof![Just(Decimal::ZERO), positive_rate()],
        n in installment_count(),
    ) {
        let start = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let schedule = generate_schedule(p, rate, n, start).unwrap();
        for inst in &schedule.installments {
            prop_assert_eq!(inst.amount, round2(inst.amount));
            prop_assert!(inst.amount >= Decimal::ZERO);
            prop_assert!(inst.balance >= Decimal::ZERO);
        }
    }

    /// Installment k lands k months after the start, on the start day or the
    /// last day of a shorter month.
    #[test]
    fn prop_due_date_spacing(
        p in principal(),
        n in installment_count(),
        start in start_date(),
    ) {
        let schedule = generate_schedule(p, Decimal::ZERO, n, start).unwrap();
        for (idx, inst) in schedule.installments.iter().enumerate() {
            let k = u32::try_from(idx + 1).unwrap();
            prop_assert_eq!(inst.sequence_no, k);
            let months = start.year() * 12 + i32::try_from(start.month0() + k).unwrap();
            let (year, month) = (months.div_euclid(12), u32::try_from(months.rem_euclid(12)).unwrap() + 1);
            prop_assert_eq!(inst.due_date.year(), year);
            prop_assert_eq!(inst.due_date.month(), month);
            prop_assert_eq!(inst.due_date.day(), start.day().min(last_day_of_month(year, month)));
        }
        for pair in schedule.installments.windows(2) {
            prop_assert!(pair[0].due_date < pair[1].due_date);
        }
    }

    /// The effective monthly rate stays below the nominal monthly rate.
    #[test]
    fn prop_monthly_rate_below_nominal(rate in positive_rate()) {
        let i = monthly_rate(rate).unwrap();
        prop_assert!(i > Decimal::ZERO);
        prop_assert!(i < rate / Decimal::from(1200));
    }
}
