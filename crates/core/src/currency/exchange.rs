//! Exchange rate types.

use chrono::{DateTime, NaiveDate, Utc};
use prestamos_shared::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A cached daily exchange rate.
///
/// One row exists per `(rate_date, base, quote)`; it is never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency.
    pub base: Currency,
    /// Target currency.
    pub quote: Currency,
    /// Exchange rate (1 base = rate quote).
    pub rate: Decimal,
    /// Date the rate is cached for.
    pub rate_date: NaiveDate,
    /// When the rate was retrieved from a provider.
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Creates a new exchange rate fetched now.
    #[must_use]
    pub fn new(base: Currency, quote: Currency, rate: Decimal, rate_date: NaiveDate) -> Self {
        Self {
            base,
            quote,
            rate,
            rate_date,
            fetched_at: Utc::now(),
        }
    }
}
