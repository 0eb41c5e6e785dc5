//! Payment reminders by email and SMS.
//!
//! The scheduler runs daily and can also be triggered right after a
//! schedule is generated. Alert rows are unique per installment and day.

pub mod error;
pub mod lead_days;
pub mod message;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::NotifyError;
pub use lead_days::{parse_lead_days, target_dates};
pub use message::Reminder;
pub use service::{AlertRepository, AlertScheduler, Mailer, SmsSender};
pub use types::{Alert, AlertStatus, AlertSummary, DueInstallment, NewAlert, RunOptions};
