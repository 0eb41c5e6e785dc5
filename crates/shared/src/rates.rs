//! Public HTTP exchange-rate providers.
//!
//! Every provider answers with a JSON document holding a `rates` object
//! keyed by quote currency.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::types::Currency;

/// Errors from a single provider attempt.
#[derive(Debug, Error)]
pub enum RateFetchError {
    /// Transport error, timeout or non-success status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The body has no usable rate for the requested quote currency.
    #[error("no usable rate for {quote} in response")]
    MissingRate {
        /// Requested quote currency.
        quote: Currency,
    },
}

/// Known providers, in their default fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateApi {
    /// api.exchangerate.host
    ExchangeRateHost,
    /// api.frankfurter.app
    Frankfurter,
    /// open.er-api.com
    OpenErApi,
}

impl RateApi {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExchangeRateHost => "exchangerate.host",
            Self::Frankfurter => "frankfurter",
            Self::OpenErApi => "open.er-api",
        }
    }

    /// Request URL for a base/quote pair.
    #[must_use]
    pub fn url(self, base: Currency, quote: Currency) -> String {
        match self {
            Self::ExchangeRateHost => format!(
                "https://api.exchangerate.host/latest?base={}&symbols={}",
                base.code(),
                quote.code()
            ),
            Self::Frankfurter => format!(
                "https://api.frankfurter.app/latest?from={}&to={}",
                base.code(),
                quote.code()
            ),
            Self::OpenErApi => format!("https://open.er-api.com/v6/latest/{}", base.code()),
        }
    }
}

/// Extracts `rates[quote]` from a provider body.
///
/// Returns `None` when the key is missing, not numeric, or not positive.
#[must_use]
pub fn parse_rate(body: &serde_json::Value, quote: Currency) -> Option<Decimal> {
    let raw = body.get("rates")?.get(quote.code())?;
    let text = match raw {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => return None,
    };

    let rate = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()?;
    (rate > Decimal::ZERO).then_some(rate)
}

/// One HTTP provider with its own timeout-bound client.
#[derive(Clone)]
pub struct HttpRateProvider {
    api: RateApi,
    client: reqwest::Client,
}

impl HttpRateProvider {
    /// Creates a provider with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api: RateApi, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { api, client })
    }

    /// Builds the configured providers in order.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &crate::config::RatesConfig) -> Result<Vec<Self>, reqwest::Error> {
        let timeout = Duration::from_secs(config.timeout_secs);
        config
            .providers
            .iter()
            .map(|api| Self::new(*api, timeout))
            .collect()
    }

    /// Which API this provider talks to.
    #[must_use]
    pub const fn api(&self) -> RateApi {
        self.api
    }

    /// Fetches the latest `base -> quote` rate.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when the body has no usable rate.
    pub async fn fetch_latest(&self, base: Currency, quote: Currency) -> Result<Decimal, RateFetchError> {
        let body: serde_json::Value = self
            .client
            .get(self.api.url(base, quote))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_rate(&body, quote).ok_or(RateFetchError::MissingRate { quote })
    }
}
