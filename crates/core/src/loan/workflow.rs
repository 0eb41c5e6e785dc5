//! Loan use cases that chain schedule generation with immediate reminders.

use std::sync::Arc;

use chrono::NaiveDate;
use prestamos_shared::{Currency, LoanId, PersonaId};
use tracing::{debug, warn};

use super::error::LoanError;
use super::service::{LifecycleService, LoanRepository};
use super::types::{EditKind, Installment, Loan, LoanUpdate, LoanWithSchedule};
use super::validation::LoanInput;
use crate::alerts::{AlertRepository, AlertScheduler, AlertSummary, Mailer, NotifyError, SmsSender};
use crate::currency::ExchangeRates;

/// Creates and restructures loans, then alerts on installments already due.
///
/// Alerting is best effort: a failure is logged and reported in the
/// summary, never as an error of the loan operation.
pub struct LoanWorkflow<R, A, X, M, S>
where
    R: LoanRepository,
    A: AlertRepository,
    X: ExchangeRates,
    M: Mailer,
    S: SmsSender,
{
    loans: Arc<R>,
    alerts: Arc<A>,
    lifecycle: LifecycleService<R, X>,
    scheduler: AlertScheduler<A, X, M, S>,
}

impl<R, A, X, M, S> LoanWorkflow<R, A, X, M, S>
where
    R: LoanRepository,
    A: AlertRepository,
    X: ExchangeRates,
    M: Mailer,
    S: SmsSender,
{
    /// Create a workflow over the given stores and transports.
    #[must_use]
    pub fn new(loans: Arc<R>, alerts: Arc<A>, rates: Arc<X>, mailer: Arc<M>, sms: Arc<S>) -> Self {
        Self {
            lifecycle: LifecycleService::new(loans.clone(), rates.clone()),
            scheduler: AlertScheduler::new(alerts.clone(), rates, mailer, sms),
            loans,
            alerts,
        }
    }

    /// Currency used in reminders for profiles without a preference.
    #[must_use]
    pub fn with_default_currency(mut self, currency: Currency) -> Self {
        self.scheduler = self.scheduler.with_default_currency(currency);
        self
    }

    /// The lifecycle service, for operations that send no reminders.
    #[must_use]
    pub fn lifecycle(&self) -> &LifecycleService<R, X> {
        &self.lifecycle
    }

    /// Create a loan, generate its schedule and alert on installments due
    /// on or before `today`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`LifecycleService::create_loan`].
    pub async fn create_loan(
        &self,
        owner_id: PersonaId,
        input: LoanInput,
        today: NaiveDate,
    ) -> Result<(LoanWithSchedule, AlertSummary), LoanError> {
        let created = self.lifecycle.create_loan(owner_id, input).await?;
        let summary = self
            .notify(owner_id, &created.loan, &created.installments, today)
            .await;
        Ok((created, summary))
    }

    /// Apply an edit. A restructure alerts on regenerated installments due
    /// on or before `today`; a descriptive edit sends nothing.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`LifecycleService::update_loan`].
    pub async fn update_loan(
        &self,
        owner_id: PersonaId,
        loan_id: LoanId,
        input: LoanInput,
        today: NaiveDate,
    ) -> Result<(LoanUpdate, AlertSummary), LoanError> {
        let update = self.lifecycle.update_loan(owner_id, loan_id, input).await?;
        let summary = if update.kind == EditKind::Restructured {
            self.notify(owner_id, &update.loan, &update.installments, today)
                .await
        } else {
            AlertSummary::default()
        };
        Ok((update, summary))
    }

    async fn notify(
        &self,
        owner_id: PersonaId,
        loan: &Loan,
        installments: &[Installment],
        today: NaiveDate,
    ) -> AlertSummary {
        if !installments.iter().any(|i| i.due_date <= today) {
            return AlertSummary::default();
        }

        match self.try_notify(owner_id, loan, installments, today).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(loan_id = %loan.id, persona_id = %owner_id, error = %e, "immediate alerts failed");
                AlertSummary {
                    failed_profiles: 1,
                    ..AlertSummary::default()
                }
            }
        }
    }

    async fn try_notify(
        &self,
        owner_id: PersonaId,
        loan: &Loan,
        installments: &[Installment],
        today: NaiveDate,
    ) -> Result<AlertSummary, NotifyError> {
        let Some(profile) = self.alerts.find_profile(owner_id).await? else {
            debug!(persona_id = %owner_id, "no profile, skipping immediate alerts");
            return Ok(AlertSummary::default());
        };

        let creditor_name = match loan.creditor_id {
            Some(creditor_id) => self
                .loans
                .find_creditor(owner_id, creditor_id)
                .await
                .map_err(|e| NotifyError::repository(e.to_string()))?
                .map(|c| c.name),
            None => None,
        };

        self.scheduler
            .notify_immediately(&profile, loan, installments, creditor_name.as_deref(), today)
            .await
    }
}
