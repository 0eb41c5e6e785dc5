//! Multi-currency handling and exchange rates.
//!
//! - Half-up rounding to cents
//! - Daily rate cache with chained remote providers
//! - Conversion for display and payment snapshots

pub mod conversion;
pub mod error;
pub mod exchange;
pub mod service;

#[cfg(test)]
mod props;

pub use conversion::{MONEY_DP, convert_amount, round2};
pub use error::RateError;
pub use exchange::ExchangeRate;
pub use service::{ExchangeRates, RateProvider, RateService, RateStore};
