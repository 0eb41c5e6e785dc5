//! Installment lifecycle: generation, regeneration, payment and deletion guards.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use prestamos_shared::{CreditorId, Currency, InstallmentId, LoanId, PersonaId};
use tracing::{debug, info, warn};

use super::error::LoanError;
use super::types::{
    Creditor, EditKind, HistoryAction, Installment, InstallmentStatus, Loan, LoanTerms, LoanUpdate,
    LoanWithSchedule, NewHistoryEntry, NewInstallment, PaymentOutcome, PaymentSnapshot,
};
use super::validation::{LoanDescriptiveEdit, LoanInput, validate_label};
use crate::currency::{ExchangeRates, convert_amount};
use crate::schedule::generate_schedule;

/// Repository trait for loans, installments, creditors and history.
///
/// Every lookup taking an owner filters by it; a record of another owner is
/// reported as missing. This trait is implemented by the db crate.
pub trait LoanRepository: Send + Sync {
    /// Find a loan by ID for an owner.
    fn find_loan(
        &self,
        owner_id: PersonaId,
        loan_id: LoanId,
    ) -> impl std::future::Future<Output = Result<Option<Loan>, LoanError>> + Send;

    /// Insert a new loan.
    fn insert_loan(
        &self,
        loan: &Loan,
    ) -> impl std::future::Future<Output = Result<(), LoanError>> + Send;

    /// Overwrite a loan's editable fields and terms.
    fn update_loan(
        &self,
        loan: &Loan,
    ) -> impl std::future::Future<Output = Result<(), LoanError>> + Send;

    /// Delete a loan; installments and alerts cascade.
    fn delete_loan(
        &self,
        owner_id: PersonaId,
        loan_id: LoanId,
    ) -> impl std::future::Future<Output = Result<bool, LoanError>> + Send;

    /// Loans of every owner that have no installments.
    fn list_loans_without_installments(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Loan>, LoanError>> + Send;

    /// Installments of a loan in sequence order.
    fn list_installments(
        &self,
        loan_id: LoanId,
    ) -> impl std::future::Future<Output = Result<Vec<Installment>, LoanError>> + Send;

    /// Number of installments of a loan.
    fn count_installments(
        &self,
        loan_id: LoanId,
    ) -> impl std::future::Future<Output = Result<u64, LoanError>> + Send;

    /// Number of paid installments of a loan.
    fn count_paid_installments(
        &self,
        loan_id: LoanId,
    ) -> impl std::future::Future<Output = Result<u64, LoanError>> + Send;

    /// Bulk insert installments.
    fn insert_installments(
        &self,
        installments: Vec<NewInstallment>,
    ) -> impl std::future::Future<Output = Result<Vec<Installment>, LoanError>> + Send;

    /// Delete every installment of a loan.
    fn delete_installments(
        &self,
        loan_id: LoanId,
    ) -> impl std::future::Future<Output = Result<u64, LoanError>> + Send;

    /// Find an installment and its loan for an owner.
    fn find_installment(
        &self,
        owner_id: PersonaId,
        installment_id: InstallmentId,
    ) -> impl std::future::Future<Output = Result<Option<(Installment, Loan)>, LoanError>> + Send;

    /// Mark a pending installment paid. Returns false if it was not pending.
    fn record_payment(
        &self,
        installment_id: InstallmentId,
        paid_date: NaiveDate,
        snapshot: Option<PaymentSnapshot>,
    ) -> impl std::future::Future<Output = Result<bool, LoanError>> + Send;

    /// Find a creditor for an owner.
    fn find_creditor(
        &self,
        owner_id: PersonaId,
        creditor_id: CreditorId,
    ) -> impl std::future::Future<Output = Result<Option<Creditor>, LoanError>> + Send;

    /// Number of loans referencing a creditor.
    fn count_loans_for_creditor(
        &self,
        creditor_id: CreditorId,
    ) -> impl std::future::Future<Output = Result<u64, LoanError>> + Send;

    /// Delete a creditor.
    fn delete_creditor(
        &self,
        owner_id: PersonaId,
        creditor_id: CreditorId,
    ) -> impl std::future::Future<Output = Result<bool, LoanError>> + Send;

    /// Append an activity history entry.
    fn append_history(
        &self,
        entry: NewHistoryEntry,
    ) -> impl std::future::Future<Output = Result<(), LoanError>> + Send;
}

/// Loan lifecycle service.
pub struct LifecycleService<R: LoanRepository, X: ExchangeRates> {
    repo: Arc<R>,
    rates: Arc<X>,
}

impl<R: LoanRepository, X: ExchangeRates> LifecycleService<R, X> {
    /// Create a new lifecycle service.
    #[must_use]
    pub fn new(repo: Arc<R>, rates: Arc<X>) -> Self {
        Self { repo, rates }
    }

    /// Create a loan and generate its schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the creditor is not the owner's,
    /// or the repository fails.
    pub async fn create_loan(
        &self,
        owner_id: PersonaId,
        input: LoanInput,
    ) -> Result<LoanWithSchedule, LoanError> {
        let terms = input.validate()?;
        let label = validate_label(&input.label)?;
        self.ensure_creditor(owner_id, input.creditor_id).await?;

        let loan = Loan {
            id: LoanId::new(),
            owner_id,
            creditor_id: input.creditor_id,
            label,
            description: input.description,
            terms,
            display_currency: input.display_currency,
            created_at: Utc::now(),
        };
        self.repo.insert_loan(&loan).await?;

        let installments = self.generate_installments(&loan).await?;
        info!(loan_id = %loan.id, count = installments.len(), "loan created");

        self.history(
            owner_id,
            HistoryAction::LoanCreated,
            format!(
                "Created loan \"{}\" for {} {} in {} installments",
                loan.label,
                loan.terms.currency,
                loan.terms.principal,
                loan.terms.installment_count
            ),
        )
        .await;

        Ok(LoanWithSchedule { loan, installments })
    }

    /// Generate and persist the schedule unless the loan already has installments.
    ///
    /// Returns the inserted installments, or an empty list when the guard held.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedule cannot be computed or stored.
    pub async fn generate_installments(&self, loan: &Loan) -> Result<Vec<Installment>, LoanError> {
        if self.repo.count_installments(loan.id).await? > 0 {
            debug!(loan_id = %loan.id, "installments already exist, skipping generation");
            return Ok(Vec::new());
        }

        let LoanTerms {
            principal,
            annual_rate,
            installment_count,
            start_date,
            ..
        } = loan.terms;
        let schedule = generate_schedule(principal, annual_rate, installment_count, start_date)?;
        if schedule.is_empty() {
            return Ok(Vec::new());
        }

        let rows = schedule
            .installments
            .into_iter()
            .map(|s| NewInstallment {
                loan_id: loan.id,
                sequence_no: s.sequence_no,
                amount: s.amount,
                due_date: s.due_date,
            })
            .collect();
        self.repo.insert_installments(rows).await
    }

    /// True when the loan has no paid installments.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn can_delete_or_restructure(&self, loan_id: LoanId) -> Result<bool, LoanError> {
        Ok(self.repo.count_paid_installments(loan_id).await? == 0)
    }

    /// True when no loan references the creditor.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn can_delete_creditor(&self, creditor_id: CreditorId) -> Result<bool, LoanError> {
        Ok(self.repo.count_loans_for_creditor(creditor_id).await? == 0)
    }

    /// Apply a full edit.
    ///
    /// If the terms are unchanged only the descriptive fields (and the display
    /// currency) are written.
    /// Otherwise the loan must have no paid installments, and its schedule is
    /// deleted and generated again.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::StructuralLock` when terms change on a loan with
    /// payments, plus validation and repository errors.
    pub async fn update_loan(
        &self,
        owner_id: PersonaId,
        loan_id: LoanId,
        input: LoanInput,
    ) -> Result<LoanUpdate, LoanError> {
        let terms = input.validate()?;
        let mut loan = self.load_loan(owner_id, loan_id).await?;

        if terms == loan.terms {
            let loan = self
                .update_descriptive(owner_id, loan_id, input.descriptive())
                .await?;
            let installments = self.repo.list_installments(loan_id).await?;
            return Ok(LoanUpdate {
                loan,
                kind: EditKind::Descriptive,
                installments,
            });
        }

        if !self.can_delete_or_restructure(loan_id).await? {
            warn!(%loan_id, "rejected structural edit on loan with payments");
            return Err(LoanError::StructuralLock(loan_id));
        }

        self.ensure_creditor(owner_id, input.creditor_id).await?;
        loan.label = validate_label(&input.label)?;
        loan.description = input.description;
        loan.creditor_id = input.creditor_id;
        loan.terms = terms;
        loan.display_currency = input.display_currency;
        self.repo.update_loan(&loan).await?;

        let removed = self.repo.delete_installments(loan_id).await?;
        let installments = self.generate_installments(&loan).await?;
        info!(%loan_id, removed, created = installments.len(), "loan restructured");

        self.history(
            owner_id,
            HistoryAction::LoanRestructured,
            format!(
                "Restructured loan \"{}\": {} {} at {}% in {} installments",
                loan.label,
                loan.terms.currency,
                loan.terms.principal,
                loan.terms.annual_rate,
                loan.terms.installment_count
            ),
        )
        .await;

        Ok(LoanUpdate {
            loan,
            kind: EditKind::Restructured,
            installments,
        })
    }

    /// Change label, description, creditor or display currency. Always allowed.
    ///
    /// # Errors
    ///
    /// Returns an error if the loan or creditor is not the owner's.
    pub async fn update_descriptive(
        &self,
        owner_id: PersonaId,
        loan_id: LoanId,
        edit: LoanDescriptiveEdit,
    ) -> Result<Loan, LoanError> {
        let mut loan = self.load_loan(owner_id, loan_id).await?;
        self.ensure_creditor(owner_id, edit.creditor_id).await?;

        loan.label = validate_label(&edit.label)?;
        loan.description = edit.description;
        loan.creditor_id = edit.creditor_id;
        if let Some(currency) = edit.display_currency {
            loan.display_currency = currency;
        }
        self.repo.update_loan(&loan).await?;

        self.history(
            owner_id,
            HistoryAction::LoanEdited,
            format!("Edited details of loan \"{}\"", loan.label),
        )
        .await;

        Ok(loan)
    }

    /// Delete a loan with no paid installments.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::HasPayments` if any installment is paid.
    pub async fn delete_loan(&self, owner_id: PersonaId, loan_id: LoanId) -> Result<(), LoanError> {
        let loan = self.load_loan(owner_id, loan_id).await?;

        if !self.can_delete_or_restructure(loan_id).await? {
            return Err(LoanError::HasPayments(loan_id));
        }

        if !self.repo.delete_loan(owner_id, loan_id).await? {
            return Err(LoanError::LoanNotFound(loan_id));
        }
        info!(%loan_id, "loan deleted");

        self.history(
            owner_id,
            HistoryAction::LoanDeleted,
            format!("Deleted loan \"{}\"", loan.label),
        )
        .await;
        Ok(())
    }

    /// Mark an installment paid and snapshot the currency conversion.
    ///
    /// `display_currency` defaults to the loan's display currency. When no
    /// rate is available the payment still goes through without a snapshot
    /// and the outcome carries a warning.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::AlreadyPaid` for paid installments, plus not found
    /// and repository errors.
    pub async fn mark_paid(
        &self,
        owner_id: PersonaId,
        installment_id: InstallmentId,
        payment_date: NaiveDate,
        display_currency: Option<Currency>,
    ) -> Result<PaymentOutcome, LoanError> {
        let (mut installment, loan) = self
            .repo
            .find_installment(owner_id, installment_id)
            .await?
            .ok_or(LoanError::InstallmentNotFound(installment_id))?;

        if installment.is_paid() {
            return Err(LoanError::AlreadyPaid(installment_id));
        }

        let origin = loan.terms.currency;
        let destination = display_currency.unwrap_or(loan.display_currency);
        let (snapshot, warning) = match self
            .rates
            .get_rate(origin, destination, payment_date)
            .await
        {
            Ok(rate) => (
                Some(PaymentSnapshot {
                    origin_currency: origin,
                    destination_currency: destination,
                    rate,
                    origin_amount: installment.amount,
                    converted_amount: convert_amount(installment.amount, rate),
                }),
                None,
            ),
            Err(e) => {
                warn!(%installment_id, %origin, %destination, error = %e, "paid without currency snapshot");
                (
                    None,
                    Some(format!(
                        "Payment recorded without a {origin}->{destination} conversion: {e}"
                    )),
                )
            }
        };

        if !self
            .repo
            .record_payment(installment_id, payment_date, snapshot.clone())
            .await?
        {
            return Err(LoanError::AlreadyPaid(installment_id));
        }

        installment.status = InstallmentStatus::Paid;
        installment.paid_date = Some(payment_date);
        installment.snapshot = snapshot;
        info!(%installment_id, loan_id = %loan.id, %payment_date, "installment paid");

        self.history(
            owner_id,
            HistoryAction::InstallmentPaid,
            format!(
                "Paid installment {} of loan \"{}\" ({} {})",
                installment.sequence_no, loan.label, origin, installment.amount
            ),
        )
        .await;

        Ok(PaymentOutcome {
            installment,
            warning,
        })
    }

    /// Delete a creditor no loan references.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::CreditorInUse` if loans still reference it.
    pub async fn delete_creditor(
        &self,
        owner_id: PersonaId,
        creditor_id: CreditorId,
    ) -> Result<(), LoanError> {
        let creditor = self
            .repo
            .find_creditor(owner_id, creditor_id)
            .await?
            .ok_or(LoanError::CreditorNotFound(creditor_id))?;

        let loans = self.repo.count_loans_for_creditor(creditor_id).await?;
        if loans > 0 {
            return Err(LoanError::CreditorInUse { creditor_id, loans });
        }

        if !self.repo.delete_creditor(owner_id, creditor_id).await? {
            return Err(LoanError::CreditorNotFound(creditor_id));
        }

        self.history(
            owner_id,
            HistoryAction::CreditorDeleted,
            format!("Deleted creditor \"{}\"", creditor.name),
        )
        .await;
        Ok(())
    }

    /// Generate schedules for every loan that has none.
    ///
    /// Returns the number of installments created.
    ///
    /// # Errors
    ///
    /// Returns an error if listing loans fails. Per-loan failures are logged
    /// and skipped.
    pub async fn backfill_schedules(&self) -> Result<usize, LoanError> {
        let loans = self.repo.list_loans_without_installments().await?;
        let mut created = 0;

        for loan in &loans {
            match self.generate_installments(loan).await {
                Ok(rows) => created += rows.len(),
                Err(e) => warn!(loan_id = %loan.id, error = %e, "backfill failed for loan"),
            }
        }

        info!(loans = loans.len(), created, "schedule backfill finished");
        Ok(created)
    }

    async fn load_loan(&self, owner_id: PersonaId, loan_id: LoanId) -> Result<Loan, LoanError> {
        self.repo
            .find_loan(owner_id, loan_id)
            .await?
            .ok_or(LoanError::LoanNotFound(loan_id))
    }

    async fn ensure_creditor(
        &self,
        owner_id: PersonaId,
        creditor_id: Option<CreditorId>,
    ) -> Result<(), LoanError> {
        let Some(creditor_id) = creditor_id else {
            return Ok(());
        };
        self.repo
            .find_creditor(owner_id, creditor_id)
            .await?
            .map(|_| ())
            .ok_or(LoanError::CreditorNotFound(creditor_id))
    }

    /// Appends to the activity history. The mutation it describes has
    /// already been stored, so a failure here is logged and not returned.
    async fn history(&self, persona_id: PersonaId, action: HistoryAction, detail: String) {
        if let Err(e) = self
            .repo
            .append_history(NewHistoryEntry {
                persona_id,
                action,
                detail,
            })
            .await
        {
            warn!(%persona_id, ?action, error = %e, "history entry not recorded");
        }
    }
}
