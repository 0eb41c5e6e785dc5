//! Loan lifecycle error types.

use prestamos_shared::{AppError, CreditorId, InstallmentId, LoanId};
use thiserror::Error;

use super::validation::LoanValidationError;
use crate::schedule::ScheduleError;

/// Loan lifecycle errors.
#[derive(Debug, Error)]
pub enum LoanError {
    /// Input failed boundary validation.
    #[error("invalid loan: {0}")]
    Validation(#[from] LoanValidationError),

    /// Loan not found for this owner.
    #[error("loan not found: {0}")]
    LoanNotFound(LoanId),

    /// Installment not found for this owner.
    #[error("installment not found: {0}")]
    InstallmentNotFound(InstallmentId),

    /// Creditor not found for this owner.
    #[error("creditor not found: {0}")]
    CreditorNotFound(CreditorId),

    /// Terms cannot change once an installment is paid.
    #[error("loan {0} has paid installments; only label, description and creditor can change")]
    StructuralLock(LoanId),

    /// A loan with paid installments cannot be deleted.
    #[error("loan {0} has paid installments and cannot be deleted")]
    HasPayments(LoanId),

    /// A creditor with loans cannot be deleted.
    #[error("creditor {creditor_id} still has {loans} loan(s)")]
    CreditorInUse {
        /// Creditor.
        creditor_id: CreditorId,
        /// Number of loans referencing it.
        loans: u64,
    },

    /// Installment was already paid.
    #[error("installment {0} is already paid")]
    AlreadyPaid(InstallmentId),

    /// Schedule generation failed.
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl LoanError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<LoanError> for AppError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::Validation(_) => Self::Validation(err.to_string()),
            LoanError::LoanNotFound(_)
            | LoanError::InstallmentNotFound(_)
            | LoanError::CreditorNotFound(_) => Self::NotFound(err.to_string()),
            LoanError::StructuralLock(_)
            | LoanError::HasPayments(_)
            | LoanError::CreditorInUse { .. } => Self::BusinessRule(err.to_string()),
            LoanError::AlreadyPaid(_) => Self::Conflict(err.to_string()),
            LoanError::Schedule(_) => Self::Internal(err.to_string()),
            LoanError::Repository(msg) => Self::Database(msg),
        }
    }
}
