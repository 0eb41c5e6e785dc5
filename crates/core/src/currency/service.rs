//! Exchange rate lookup with a permanent daily cache and chained providers.

use std::sync::Arc;

use chrono::NaiveDate;
use prestamos_shared::{Currency, HttpRateProvider};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::conversion::round2;
use super::error::RateError;
use super::exchange::ExchangeRate;

/// Persistence for cached rates.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait RateStore: Send + Sync {
    /// Find the cached rate for a key.
    fn find_rate(
        &self,
        rate_date: NaiveDate,
        base: Currency,
        quote: Currency,
    ) -> impl std::future::Future<Output = Result<Option<Decimal>, RateError>> + Send;

    /// Insert the rate unless its key already exists, then return the stored row.
    ///
    /// When two writers race on one key the first row wins and is returned to both.
    fn get_or_create(
        &self,
        rate: ExchangeRate,
    ) -> impl std::future::Future<Output = Result<ExchangeRate, RateError>> + Send;
}

/// A remote source of live rates.
pub trait RateProvider: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the latest rate. Any failure is `None`.
    fn fetch(
        &self,
        base: Currency,
        quote: Currency,
    ) -> impl std::future::Future<Output = Option<Decimal>> + Send;
}

impl RateProvider for HttpRateProvider {
    fn name(&self) -> &'static str {
        self.api().name()
    }

    async fn fetch(&self, base: Currency, quote: Currency) -> Option<Decimal> {
        match self.fetch_latest(base, quote).await {
            Ok(rate) => Some(rate),
            Err(e) => {
                warn!(provider = self.api().name(), %base, %quote, error = %e, "rate provider failed");
                None
            }
        }
    }
}

/// Rate lookup and conversion as used by the rest of the core.
pub trait ExchangeRates: Send + Sync {
    /// Rate for `base -> quote` as of `date`.
    fn get_rate(
        &self,
        base: Currency,
        quote: Currency,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Decimal, RateError>> + Send;

    /// Converts `amount` from one currency to another, rounded to two decimals.
    ///
    /// Same-currency requests return `amount` untouched without a lookup.
    fn convert(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Decimal, RateError>> + Send {
        async move {
            if from == to {
                return Ok(amount);
            }
            let rate = self.get_rate(from, to, date).await?;
            Ok(round2(amount * rate))
        }
    }
}

/// Cache-aside rate service.
pub struct RateService<S: RateStore, P: RateProvider> {
    store: Arc<S>,
    providers: Vec<P>,
}

impl<S: RateStore, P: RateProvider> RateService<S, P> {
    /// Create a rate service. Providers are tried in the given order.
    #[must_use]
    pub fn new(store: Arc<S>, providers: Vec<P>) -> Self {
        Self { store, providers }
    }

    async fn fetch_remote(&self, base: Currency, quote: Currency) -> Option<(&'static str, Decimal)> {
        for provider in &self.providers {
            match provider.fetch(base, quote).await {
                Some(rate) if rate > Decimal::ZERO => return Some((provider.name(), rate)),
                _ => debug!(provider = provider.name(), %base, %quote, "no rate, trying next provider"),
            }
        }
        None
    }
}

impl<S: RateStore, P: RateProvider> ExchangeRates for RateService<S, P> {
    async fn get_rate(
        &self,
        base: Currency,
        quote: Currency,
        date: NaiveDate,
    ) -> Result<Decimal, RateError> {
        if base == quote {
            return Ok(Decimal::ONE);
        }

        if let Some(rate) = self.store.find_rate(date, base, quote).await? {
            debug!(%base, %quote, %date, %rate, "rate cache hit");
            return Ok(rate);
        }

        let Some((provider, rate)) = self.fetch_remote(base, quote).await else {
            warn!(%base, %quote, %date, "all rate providers failed");
            return Err(RateError::NoRateAvailable { base, quote, date });
        };

        let stored = self
            .store
            .get_or_create(ExchangeRate::new(base, quote, rate, date))
            .await?;
        info!(provider, %base, %quote, %date, rate = %stored.rate, "rate cached");
        Ok(stored.rate)
    }
}
