//! Loan, creditor, profile and installment types.

use chrono::{DateTime, NaiveDate, Utc};
use prestamos_shared::{CreditorId, Currency, HistoryId, InstallmentId, LoanId, PersonaId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user profile with contact channels and notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Profile ID.
    pub id: PersonaId,
    /// Given names.
    pub first_name: String,
    /// Family names.
    pub last_name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone, free-form.
    pub phone: Option<String>,
    /// Email reminders enabled.
    pub notify_email: bool,
    /// SMS reminders enabled.
    pub notify_sms: bool,
    /// Comma-separated lead days, e.g. `"7,3,1,0"`.
    pub lead_days: Option<String>,
    /// Currency amounts are shown in.
    pub preferred_currency: Option<Currency>,
}

/// Creditor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditorKind {
    /// A natural person.
    Individual,
    /// A bank or company.
    Business,
}

/// Someone the user owes money to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creditor {
    /// Creditor ID.
    pub id: CreditorId,
    /// Owning profile.
    pub owner_id: PersonaId,
    /// Display name.
    pub name: String,
    /// Creditor type.
    pub kind: CreditorKind,
    /// Tax or national id.
    pub identification: Option<String>,
    /// Bank name.
    pub bank_name: Option<String>,
    /// Account number.
    pub account_number: Option<String>,
}

/// Terms that shape the schedule. Locked once any installment is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Principal.
    pub principal: Decimal,
    /// Annual nominal rate, percent.
    pub annual_rate: Decimal,
    /// Number of monthly installments.
    pub installment_count: u32,
    /// Start date; installment k is due k months later.
    pub start_date: NaiveDate,
    /// Currency the loan is denominated in.
    pub currency: Currency,
}

/// A loan record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Loan ID.
    pub id: LoanId,
    /// Owning profile.
    pub owner_id: PersonaId,
    /// Optional creditor.
    pub creditor_id: Option<CreditorId>,
    /// Short label, usually the lender's name.
    pub label: String,
    /// Optional description.
    pub description: Option<String>,
    /// Structural terms.
    #[serde(flatten)]
    pub terms: LoanTerms,
    /// Currency the user pays or views the loan in.
    pub display_currency: Currency,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Installment state as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// Not yet paid.
    Pending,
    /// Paid. Terminal.
    Paid,
}

/// Installment state as shown, with overdue derived from the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    /// Pending and not yet due.
    Pending,
    /// Paid.
    Paid,
    /// Pending and due before today.
    Overdue,
}

/// Currency facts frozen when an installment is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    /// Loan currency.
    pub origin_currency: Currency,
    /// Display currency at payment time.
    pub destination_currency: Currency,
    /// Rate used.
    pub rate: Decimal,
    /// Installment amount in the loan currency.
    pub origin_amount: Decimal,
    /// `round2(origin_amount * rate)`.
    pub converted_amount: Decimal,
}

/// A persisted installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    /// Installment ID.
    pub id: InstallmentId,
    /// Parent loan.
    pub loan_id: LoanId,
    /// 1-based position, unique within the loan.
    pub sequence_no: u32,
    /// Amount due in the loan currency.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Stored status.
    pub status: InstallmentStatus,
    /// Set when paid.
    pub paid_date: Option<NaiveDate>,
    /// Set when paid and a rate was available.
    pub snapshot: Option<PaymentSnapshot>,
}

impl Installment {
    /// True once paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// Pending and due strictly before `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InstallmentStatus::Pending && self.due_date < today
    }

    /// Status with overdue derived.
    #[must_use]
    pub fn display_status(&self, today: NaiveDate) -> DisplayStatus {
        match self.status {
            InstallmentStatus::Paid => DisplayStatus::Paid,
            InstallmentStatus::Pending if self.due_date < today => DisplayStatus::Overdue,
            InstallmentStatus::Pending => DisplayStatus::Pending,
        }
    }
}

/// An installment about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstallment {
    /// Parent loan.
    pub loan_id: LoanId,
    /// 1-based position.
    pub sequence_no: u32,
    /// Amount due.
    pub amount: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
}

/// A loan together with its installments.
#[derive(Debug, Clone)]
pub struct LoanWithSchedule {
    /// The loan.
    pub loan: Loan,
    /// Installments in sequence order.
    pub installments: Vec<Installment>,
}

/// What an edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Only label, description or creditor changed.
    Descriptive,
    /// Terms changed; installments were regenerated.
    Restructured,
}

/// Result of editing a loan.
#[derive(Debug, Clone)]
pub struct LoanUpdate {
    /// Loan after the edit.
    pub loan: Loan,
    /// What kind of edit was applied.
    pub kind: EditKind,
    /// Installments after the edit.
    pub installments: Vec<Installment>,
}

/// Result of marking an installment paid.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Installment after payment.
    pub installment: Installment,
    /// Set when the payment went through without a currency snapshot.
    pub warning: Option<String>,
}

/// Actions recorded in the activity history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// Loan created and schedule generated.
    LoanCreated,
    /// Terms edited and schedule regenerated.
    LoanRestructured,
    /// Label, description or creditor edited.
    LoanEdited,
    /// Loan deleted.
    LoanDeleted,
    /// Installment marked paid.
    InstallmentPaid,
    /// Creditor deleted.
    CreditorDeleted,
}

impl HistoryAction {
    /// Stable code stored in the database.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::LoanCreated => "loan_created",
            Self::LoanRestructured => "loan_restructured",
            Self::LoanEdited => "loan_edited",
            Self::LoanDeleted => "loan_deleted",
            Self::InstallmentPaid => "installment_paid",
            Self::CreditorDeleted => "creditor_deleted",
        }
    }

    /// Parses a stored code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::LoanCreated,
            Self::LoanRestructured,
            Self::LoanEdited,
            Self::LoanDeleted,
            Self::InstallmentPaid,
            Self::CreditorDeleted,
        ]
        .into_iter()
        .find(|a| a.code() == code)
    }
}

/// A history entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    /// Owning profile.
    pub persona_id: PersonaId,
    /// Action.
    pub action: HistoryAction,
    /// Human-readable detail.
    pub detail: String,
}

/// A stored history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry ID.
    pub id: HistoryId,
    /// Owning profile.
    pub persona_id: PersonaId,
    /// Action.
    pub action: HistoryAction,
    /// Human-readable detail.
    pub detail: String,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}
