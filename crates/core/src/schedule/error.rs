//! Schedule generation error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from the amortization engine.
///
/// Inputs are validated before they reach the engine, so these only fire on
/// contract violations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Principal is negative.
    #[error("principal must not be negative: {0}")]
    NegativePrincipal(Decimal),

    /// Annual rate is negative.
    #[error("annual rate must not be negative: {0}")]
    NegativeRate(Decimal),

    /// The monthly rate could not be represented as a decimal.
    #[error("monthly rate for {0}% annual is not representable")]
    RateNotRepresentable(Decimal),

    /// A due date falls outside the supported calendar.
    #[error("due date out of range: {start} + {months} months")]
    DateOutOfRange {
        /// Loan start date.
        start: NaiveDate,
        /// Months added.
        months: u32,
    },

    /// Decimal overflow while compounding.
    #[error("arithmetic overflow while compounding {0} periods")]
    Overflow(u32),
}
