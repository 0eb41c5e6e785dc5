//! Alert scheduler: finds due and overdue installments and sends reminders.

use std::sync::Arc;

use chrono::NaiveDate;
use prestamos_shared::{
    AlertId, Currency, EmailService, InstallmentId, Money, PersonaId, SmsOutcome, SmsService,
};
use tracing::{debug, info, warn};

use super::error::NotifyError;
use super::lead_days::{parse_lead_days, target_dates};
use super::message::Reminder;
use super::types::{Alert, AlertStatus, AlertSummary, DueInstallment, NewAlert, RunOptions};
use crate::currency::ExchangeRates;
use crate::loan::{Installment, Loan, Profile};

/// Repository trait for alert scheduling.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait AlertRepository: Send + Sync {
    /// Every profile.
    fn list_profiles(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Profile>, NotifyError>> + Send;

    /// A single profile.
    fn find_profile(
        &self,
        persona_id: PersonaId,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, NotifyError>> + Send;

    /// The owner's pending installments due on one of `dates`.
    fn pending_due_on(
        &self,
        owner_id: PersonaId,
        dates: &[NaiveDate],
    ) -> impl std::future::Future<Output = Result<Vec<DueInstallment>, NotifyError>> + Send;

    /// The owner's pending installments due strictly before `today`.
    fn pending_overdue(
        &self,
        owner_id: PersonaId,
        today: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<DueInstallment>, NotifyError>> + Send;

    /// Insert the alert unless one exists for `(installment, alert_date)`,
    /// then return the stored row.
    fn record_alert(
        &self,
        alert: NewAlert,
    ) -> impl std::future::Future<Output = Result<Alert, NotifyError>> + Send;

    /// Update an alert's delivery state.
    fn set_alert_status(
        &self,
        alert_id: AlertId,
        status: AlertStatus,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// Mail collaborator. Fails loudly on transport errors.
pub trait Mailer: Send + Sync {
    /// Send a plain-text email.
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// SMS collaborator. Never fails; the outcome says whether it was sent.
pub trait SmsSender: Send + Sync {
    /// Send a text message.
    fn send_sms(&self, to: &str, body: &str) -> impl std::future::Future<Output = SmsOutcome> + Send;
}

impl Mailer for EmailService {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        Ok(EmailService::send_email(self, to, subject, body).await?)
    }
}

impl SmsSender for SmsService {
    async fn send_sms(&self, to: &str, body: &str) -> SmsOutcome {
        SmsService::send_sms(self, to, body).await
    }
}

/// Alert scheduler.
pub struct AlertScheduler<A, X, M, S>
where
    A: AlertRepository,
    X: ExchangeRates,
    M: Mailer,
    S: SmsSender,
{
    repo: Arc<A>,
    rates: Arc<X>,
    mailer: Arc<M>,
    sms: Arc<S>,
    default_currency: Currency,
}

impl<A, X, M, S> AlertScheduler<A, X, M, S>
where
    A: AlertRepository,
    X: ExchangeRates,
    M: Mailer,
    S: SmsSender,
{
    /// Create a scheduler.
    #[must_use]
    pub fn new(repo: Arc<A>, rates: Arc<X>, mailer: Arc<M>, sms: Arc<S>) -> Self {
        Self {
            repo,
            rates,
            mailer,
            sms,
            default_currency: Currency::default(),
        }
    }

    /// Currency used for profiles without a preference.
    #[must_use]
    pub fn with_default_currency(mut self, currency: Currency) -> Self {
        self.default_currency = currency;
        self
    }

    /// Run over every profile.
    ///
    /// A failing profile is logged and counted; the run continues.
    ///
    /// # Errors
    ///
    /// Returns an error only if the profile list cannot be read.
    pub async fn run(&self, opts: RunOptions) -> Result<AlertSummary, NotifyError> {
        let profiles = self.repo.list_profiles().await?;
        let mut summary = AlertSummary::default();

        for profile in &profiles {
            match self.run_profile(profile, &opts).await {
                Ok(part) => summary.merge(part),
                Err(e) => {
                    warn!(persona_id = %profile.id, error = %e, "alert run failed for profile");
                    summary.failed_profiles += 1;
                }
            }
        }

        info!(
            profiles = profiles.len(),
            created = summary.created,
            sent = summary.sent,
            overdue = summary.overdue,
            dry_run = opts.dry_run,
            "alert run finished"
        );
        Ok(summary)
    }

    /// Alerts for freshly generated installments, limited to those due today or earlier.
    ///
    /// # Errors
    ///
    /// Returns an error if an alert cannot be recorded.
    pub async fn notify_immediately(
        &self,
        profile: &Profile,
        loan: &Loan,
        installments: &[Installment],
        creditor_name: Option<&str>,
        today: NaiveDate,
    ) -> Result<AlertSummary, NotifyError> {
        let opts = RunOptions {
            today,
            default_lead_days: 0,
            dry_run: false,
        };
        let mut summary = AlertSummary::default();

        for installment in installments
            .iter()
            .filter(|i| !i.is_paid() && i.due_date <= today)
        {
            let due = DueInstallment {
                installment: installment.clone(),
                loan: loan.clone(),
                creditor_name: creditor_name.map(str::to_string),
            };
            let overdue = installment.due_date < today;
            summary.sent += self.process(profile, &due, overdue, &opts).await?;
            summary.created += 1;
            if overdue {
                summary.overdue += 1;
            }
        }

        Ok(summary)
    }

    async fn run_profile(
        &self,
        profile: &Profile,
        opts: &RunOptions,
    ) -> Result<AlertSummary, NotifyError> {
        let lead_days = parse_lead_days(profile.lead_days.as_deref(), opts.default_lead_days);
        let dates = target_dates(opts.today, &lead_days);

        let upcoming = self.repo.pending_due_on(profile.id, &dates).await?;
        let overdue = self.repo.pending_overdue(profile.id, opts.today).await?;
        debug!(
            persona_id = %profile.id,
            ?lead_days,
            upcoming = upcoming.len(),
            overdue = overdue.len(),
            "evaluating profile"
        );

        let mut summary = AlertSummary {
            overdue: overdue.len(),
            ..AlertSummary::default()
        };
        for due in &upcoming {
            summary.sent += self.process(profile, due, false, opts).await?;
        }
        for due in &overdue {
            summary.sent += self.process(profile, due, true, opts).await?;
        }
        summary.created = upcoming.len() + overdue.len();

        Ok(summary)
    }

    /// Records the alert and dispatches it. Returns the number of messages sent.
    async fn process(
        &self,
        profile: &Profile,
        due: &DueInstallment,
        overdue: bool,
        opts: &RunOptions,
    ) -> Result<usize, NotifyError> {
        let currency = profile.preferred_currency.unwrap_or(self.default_currency);
        let amount = self.display_amount(due, currency).await;
        let reminder = Reminder {
            first_name: &profile.first_name,
            sequence_no: due.installment.sequence_no,
            lender: due.lender(),
            due_date: due.installment.due_date,
            amount,
            overdue,
        };

        let alert = self
            .repo
            .record_alert(NewAlert {
                installment_id: due.installment.id,
                alert_date: opts.today,
                message: reminder.email_body(),
            })
            .await?;

        if opts.dry_run {
            debug!(installment_id = %due.installment.id, "dry run, not dispatching");
            return Ok(0);
        }

        let mut sent = 0;
        if profile.notify_email {
            sent += self.dispatch_email(profile, &reminder, due.installment.id).await;
        }
        if profile.notify_sms {
            sent += self.dispatch_sms(profile, &reminder, due.installment.id).await;
        }

        if sent > 0 && alert.status != AlertStatus::Sent {
            self.repo.set_alert_status(alert.id, AlertStatus::Sent).await?;
        }
        Ok(sent)
    }

    async fn dispatch_email(
        &self,
        profile: &Profile,
        reminder: &Reminder<'_>,
        installment_id: InstallmentId,
    ) -> usize {
        let Some(to) = profile.email.as_deref().filter(|e| !e.trim().is_empty()) else {
            return 0;
        };
        match self
            .mailer
            .send_email(to, &reminder.email_subject(), &reminder.email_body())
            .await
        {
            Ok(()) => 1,
            Err(e) => {
                warn!(%installment_id, persona_id = %profile.id, error = %e, "reminder email not sent");
                0
            }
        }
    }

    async fn dispatch_sms(
        &self,
        profile: &Profile,
        reminder: &Reminder<'_>,
        installment_id: InstallmentId,
    ) -> usize {
        let Some(phone) = profile.phone.as_deref().filter(|p| !p.trim().is_empty()) else {
            return 0;
        };
        let outcome = self.sms.send_sms(phone, &reminder.sms_body()).await;
        if outcome.ok {
            1
        } else {
            warn!(%installment_id, persona_id = %profile.id, detail = %outcome.detail, "reminder SMS not sent");
            0
        }
    }

    async fn display_amount(&self, due: &DueInstallment, currency: Currency) -> Money {
        let origin = due.loan.terms.currency;
        match self
            .rates
            .convert(due.installment.amount, origin, currency, due.installment.due_date)
            .await
        {
            Ok(amount) => Money::new(amount, currency),
            Err(e) => {
                warn!(
                    installment_id = %due.installment.id,
                    %origin,
                    %currency,
                    error = %e,
                    "showing reminder amount unconverted"
                );
                Money::new(due.installment.amount, origin)
            }
        }
    }
}
