//! Alert types.

use chrono::NaiveDate;
use prestamos_shared::{AlertId, InstallmentId};
use serde::{Deserialize, Serialize};

use crate::loan::{Installment, Loan};

/// Alert delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Recorded, nothing delivered yet.
    Pending,
    /// At least one channel delivered it.
    Sent,
    /// Withdrawn.
    Cancelled,
}

/// A stored alert. At most one exists per installment and day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Alert ID.
    pub id: AlertId,
    /// Installment the alert is about.
    pub installment_id: InstallmentId,
    /// Day the alert was generated.
    pub alert_date: NaiveDate,
    /// Message body.
    pub message: String,
    /// Delivery state.
    pub status: AlertStatus,
}

/// An alert to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    /// Installment the alert is about.
    pub installment_id: InstallmentId,
    /// Day the alert is generated.
    pub alert_date: NaiveDate,
    /// Message body.
    pub message: String,
}

/// A pending installment with the loan context needed to describe it.
#[derive(Debug, Clone)]
pub struct DueInstallment {
    /// The installment.
    pub installment: Installment,
    /// Its loan.
    pub loan: Loan,
    /// Creditor name, if the loan references one.
    pub creditor_name: Option<String>,
}

impl DueInstallment {
    /// Name shown for the lender: the creditor name, else the loan label.
    #[must_use]
    pub fn lender(&self) -> &str {
        self.creditor_name.as_deref().unwrap_or(&self.loan.label)
    }
}

/// Options for one scheduler run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// The day the run treats as today.
    pub today: NaiveDate,
    /// Lead days used when a profile has no usable preference.
    pub default_lead_days: u32,
    /// Record alerts but do not deliver anything.
    pub dry_run: bool,
}

/// Counters from a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    /// Installments processed (upcoming plus overdue).
    pub created: usize,
    /// Messages actually delivered.
    pub sent: usize,
    /// Overdue installments processed.
    pub overdue: usize,
    /// Profiles skipped because of a repository error.
    pub failed_profiles: usize,
}

impl AlertSummary {
    /// Adds another summary's counters to this one.
    pub fn merge(&mut self, other: Self) {
        self.created += other.created;
        self.sent += other.sent;
        self.overdue += other.overdue;
        self.failed_profiles += other.failed_profiles;
    }
}
