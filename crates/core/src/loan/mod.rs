//! Loans, creditors and the installment lifecycle.
//!
//! This module provides:
//! - Boundary validation of loan input
//! - Schedule generation guarded against duplicates
//! - Regeneration on edit while nothing is paid
//! - Payment with a frozen currency snapshot
//! - Delete guards for loans and creditors
//! - Activity history
//! - Immediate reminders for installments already due

pub mod error;
pub mod service;
pub mod types;
pub mod validation;
pub mod workflow;


pub use error::LoanError;
pub use service::{LifecycleService, LoanRepository};
pub use types::{
    Creditor, CreditorKind, DisplayStatus, EditKind, HistoryAction, HistoryEntry, Installment,
    InstallmentStatus, Loan, LoanTerms, LoanUpdate, LoanWithSchedule, NewHistoryEntry,
    NewInstallment, PaymentOutcome, PaymentSnapshot, Profile,
};
pub use validation::{LoanDescriptiveEdit, LoanInput, LoanValidationError, validate_label};
pub use workflow::LoanWorkflow;
