//! Installment display rows with currency equivalents.

use chrono::NaiveDate;
use prestamos_shared::{Currency, InstallmentId, Money};
use serde::Serialize;
use tracing::debug;

use crate::currency::ExchangeRates;
use crate::loan::{DisplayStatus, Installment};

/// One installment as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallmentView {
    /// Installment ID.
    pub id: InstallmentId,
    /// Installment number.
    pub sequence_no: u32,
    /// Amount in the loan currency.
    pub amount: Money,
    /// Due date.
    pub due_date: NaiveDate,
    /// Payment date, if paid.
    pub paid_date: Option<NaiveDate>,
    /// Status with overdue derived.
    pub status: DisplayStatus,
    /// Amount in the display currency, when it differs and is known.
    pub equivalent: Option<Money>,
}

impl InstallmentView {
    /// Builds the row.
    ///
    /// The equivalent comes from the payment snapshot when the installment is
    /// paid and the snapshot matches `display_currency`; otherwise it is
    /// converted at the paid date (or due date). A failed conversion leaves it
    /// empty.
    pub async fn build<X: ExchangeRates>(
        installment: &Installment,
        loan_currency: Currency,
        display_currency: Currency,
        rates: &X,
        today: NaiveDate,
    ) -> Self {
        let equivalent = if loan_currency == display_currency {
            None
        } else {
            Self::equivalent(installment, loan_currency, display_currency, rates).await
        };

        Self {
            id: installment.id,
            sequence_no: installment.sequence_no,
            amount: Money::new(installment.amount, loan_currency),
            due_date: installment.due_date,
            paid_date: installment.paid_date,
            status: installment.display_status(today),
            equivalent,
        }
    }

    async fn equivalent<X: ExchangeRates>(
        installment: &Installment,
        loan_currency: Currency,
        display_currency: Currency,
        rates: &X,
    ) -> Option<Money> {
        if installment.is_paid()
            && let Some(snapshot) = installment
                .snapshot
                .as_ref()
                .filter(|s| s.destination_currency == display_currency)
        {
            return Some(Money::new(snapshot.converted_amount, display_currency));
        }

        let as_of = installment
            .paid_date
            .filter(|_| installment.is_paid())
            .unwrap_or(installment.due_date);

        match rates
            .convert(installment.amount, loan_currency, display_currency, as_of)
            .await
        {
            Ok(amount) => Some(Money::new(amount, display_currency)),
            Err(e) => {
                debug!(installment_id = %installment.id, error = %e, "no equivalent for installment");
                None
            }
        }
    }
}
