//! Exchange rate error types.

use chrono::NaiveDate;
use prestamos_shared::{AppError, Currency};
use thiserror::Error;

/// Rate lookup errors.
#[derive(Debug, Error)]
pub enum RateError {
    /// Cache miss and every provider failed.
    #[error("no exchange rate available for {base}->{quote} on {date}")]
    NoRateAvailable {
        /// Source currency.
        base: Currency,
        /// Target currency.
        quote: Currency,
        /// Requested date.
        date: NaiveDate,
    },

    /// Rate cache read or write failed.
    #[error("rate store error: {0}")]
    Store(String),
}

impl RateError {
    /// Create a store error.
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

impl From<RateError> for AppError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::NoRateAvailable { .. } => Self::ExternalService(err.to_string()),
            RateError::Store(msg) => Self::Database(msg),
        }
    }
}
