//! Amortization engine.
//!
//! Two schedules are supported:
//! - Zero rate: principal split evenly, the last installment absorbs the
//!   rounding remainder.
//! - Positive rate: French (fixed payment) amortization on the effective
//!   monthly rate, the last installment absorbs the rounding remainder so
//!   the schedule sums exactly to `round2(payment * n)`.
//!
//! The annual-to-monthly rate conversion is the single floating-point step.
//! Its result is quantized to ten decimals and all later math is fixed-point.

use chrono::{Months, NaiveDate};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::error::ScheduleError;
use crate::currency::round2;

/// Decimal places kept for the monthly rate.
pub const MONTHLY_RATE_DP: u32 = 10;

/// One generated installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    /// 1-based position in the schedule.
    pub sequence_no: u32,
    /// Amount due.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Interest part of `amount`.
    pub interest: Decimal,
    /// Principal part of `amount`.
    pub capital: Decimal,
    /// Outstanding principal after this installment, floored at zero.
    pub balance: Decimal,
}

/// A generated schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Effective monthly rate (zero for interest-free loans).
    pub monthly_rate: Decimal,
    /// Regular installment amount.
    pub payment: Decimal,
    /// Sum the installments reconcile to.
    pub total: Decimal,
    /// Installments in due order.
    pub installments: Vec<ScheduledInstallment>,
}

impl Schedule {
    fn empty() -> Self {
        Self {
            monthly_rate: Decimal::ZERO,
            payment: Decimal::ZERO,
            total: Decimal::ZERO,
            installments: Vec::new(),
        }
    }

    /// Number of installments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.installments.len()
    }

    /// True when nothing was generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    /// Sum of all installment amounts.
    #[must_use]
    pub fn sum(&self) -> Decimal {
        self.installments.iter().map(|i| i.amount).sum()
    }

    /// Total interest over the schedule.
    #[must_use]
    pub fn total_interest(&self) -> Decimal {
        self.installments.iter().map(|i| i.interest).sum()
    }
}

/// Due date of installment `k`: `k` calendar months after `start`.
///
/// The day of month is kept where possible and clamped to month-end otherwise,
/// so Jan 31 + 1 month is Feb 28 (or 29).
///
/// # Errors
///
/// Returns `ScheduleError::DateOutOfRange` past the end of the calendar.
pub fn due_date(start: NaiveDate, k: u32) -> Result<NaiveDate, ScheduleError> {
    start
        .checked_add_months(Months::new(k))
        .ok_or(ScheduleError::DateOutOfRange { start, months: k })
}

/// Effective monthly rate for an annual percentage: `(1 + r/100)^(1/12) - 1`.
///
/// # Errors
///
/// Returns an error for negative rates or when the result is not representable.
#[allow(clippy::float_arithmetic)]
pub fn monthly_rate(annual_rate_percent: Decimal) -> Result<Decimal, ScheduleError> {
    if annual_rate_percent.is_sign_negative() && !annual_rate_percent.is_zero() {
        return Err(ScheduleError::NegativeRate(annual_rate_percent));
    }
    if annual_rate_percent.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let annual = (annual_rate_percent / Decimal::ONE_HUNDRED)
        .to_f64()
        .ok_or(ScheduleError::RateNotRepresentable(annual_rate_percent))?;
    let monthly = (1.0 + annual).powf(1.0 / 12.0) - 1.0;

    Decimal::from_f64(monthly)
        .map(|m| m.round_dp_with_strategy(MONTHLY_RATE_DP, RoundingStrategy::MidpointAwayFromZero))
        .filter(|m| *m > Decimal::ZERO)
        .ok_or(ScheduleError::RateNotRepresentable(annual_rate_percent))
}

/// Generates the installment schedule for a loan.
///
/// A count of zero yields an empty schedule.
///
/// # Errors
///
/// Returns an error for negative inputs, unrepresentable rates, or due dates
/// past the end of the calendar.
pub fn generate_schedule(
    principal: Decimal,
    annual_rate_percent: Decimal,
    installment_count: u32,
    start_date: NaiveDate,
) -> Result<Schedule, ScheduleError> {
    if installment_count == 0 {
        return Ok(Schedule::empty());
    }
    if principal.is_sign_negative() && !principal.is_zero() {
        return Err(ScheduleError::NegativePrincipal(principal));
    }

    let i = monthly_rate(annual_rate_percent)?;
    if i.is_zero() {
        flat_schedule(principal, installment_count, start_date)
    } else {
        french_schedule(principal, i, installment_count, start_date)
    }
}

fn flat_schedule(principal: Decimal, n: u32, start: NaiveDate) -> Result<Schedule, ScheduleError> {
    let base = round2(principal / Decimal::from(n));
    let last = round2(principal - base * Decimal::from(n - 1));

    let mut balance = principal;
    let mut installments = Vec::with_capacity(n as usize);
    for k in 1..=n {
        let amount = if k == n { last } else { base };
        balance = (balance - amount).max(Decimal::ZERO);
        installments.push(ScheduledInstallment {
            sequence_no: k,
            amount,
            due_date: due_date(start, k)?,
            interest: Decimal::ZERO,
            capital: amount,
            balance,
        });
    }

    Ok(Schedule {
        monthly_rate: Decimal::ZERO,
        payment: base,
        total: round2(principal),
        installments,
    })
}

fn french_schedule(
    principal: Decimal,
    i: Decimal,
    n: u32,
    start: NaiveDate,
) -> Result<Schedule, ScheduleError> {
    let one_plus = Decimal::ONE + i;
    let mut growth = Decimal::ONE;
    for _ in 0..n {
        growth = growth.checked_mul(one_plus).ok_or(ScheduleError::Overflow(n))?;
    }

    // P * i / (1 - (1+i)^-n)
    let discount = Decimal::ONE - Decimal::ONE / growth;
    let payment = round2(principal * i / discount);
    let total = round2(payment * Decimal::from(n));

    let mut balance = principal;
    let mut paid = Decimal::ZERO;
    let mut installments = Vec::with_capacity(n as usize);
    for k in 1..=n {
        let amount = if k == n { total - paid } else { payment };
        let interest = round2(balance * i);
        let capital = amount - interest;
        balance = (balance - capital).max(Decimal::ZERO);
        paid += amount;

        installments.push(ScheduledInstallment {
            sequence_no: k,
            amount,
            due_date: due_date(start, k)?,
            interest,
            capital,
            balance,
        });
    }

    Ok(Schedule {
        monthly_rate: i,
        payment,
        total,
        installments,
    })
}
