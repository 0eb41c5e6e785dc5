//! Exchange rate repository backing the permanent daily rate cache.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::mapping::rate_to_domain;
use crate::entities::exchange_rates;
use prestamos_core::currency::{ExchangeRate, RateError, RateStore};
use prestamos_shared::Currency;

fn db_err(e: DbErr) -> RateError {
    RateError::store(e.to_string())
}

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        rate_date: NaiveDate,
        base: Currency,
        quote: Currency,
    ) -> Result<Option<exchange_rates::Model>, RateError> {
        exchange_rates::Entity::find()
            .filter(exchange_rates::Column::RateDate.eq(rate_date))
            .filter(exchange_rates::Column::BaseCurrency.eq(base.code()))
            .filter(exchange_rates::Column::QuoteCurrency.eq(quote.code()))
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

impl RateStore for ExchangeRateRepository {
    async fn find_rate(
        &self,
        rate_date: NaiveDate,
        base: Currency,
        quote: Currency,
    ) -> Result<Option<Decimal>, RateError> {
        Ok(self
            .find_model(rate_date, base, quote)
            .await?
            .map(|m| m.rate))
    }

    async fn get_or_create(&self, rate: ExchangeRate) -> Result<ExchangeRate, RateError> {
        let active_model = exchange_rates::ActiveModel {
            id: Set(Uuid::now_v7()),
            rate_date: Set(rate.rate_date),
            base_currency: Set(rate.base.code().to_string()),
            quote_currency: Set(rate.quote.code().to_string()),
            rate: Set(rate.rate),
            fetched_at: Set(rate.fetched_at.into()),
        };

        // A concurrent writer may have inserted the key first; its row wins.
        exchange_rates::Entity::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    exchange_rates::Column::RateDate,
                    exchange_rates::Column::BaseCurrency,
                    exchange_rates::Column::QuoteCurrency,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(db_err)?;

        let stored = self
            .find_model(rate.rate_date, rate.base, rate.quote)
            .await?
            .ok_or_else(|| RateError::store("rate vanished after insert"))?;
        rate_to_domain(stored).map_err(RateError::store)
    }
}
