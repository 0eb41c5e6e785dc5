//! Reminder message texts.

use chrono::NaiveDate;
use prestamos_shared::Money;

/// What a reminder talks about.
#[derive(Debug, Clone)]
pub struct Reminder<'a> {
    /// Recipient's first name.
    pub first_name: &'a str,
    /// Installment number.
    pub sequence_no: u32,
    /// Creditor or loan label.
    pub lender: &'a str,
    /// Due date.
    pub due_date: NaiveDate,
    /// Amount, converted to the recipient's currency when possible.
    pub amount: Money,
    /// Due before today.
    pub overdue: bool,
}

impl Reminder<'_> {
    /// Email subject.
    #[must_use]
    pub fn email_subject(&self) -> String {
        let tag = if self.overdue { "Overdue" } else { "Reminder" };
        format!("[{tag}] Installment {}", self.sequence_no)
    }

    /// Email body.
    #[must_use]
    pub fn email_body(&self) -> String {
        format!(
            "Hello {},\n\n\
             Installment {} of your loan with {}.\n\
             Due: {}.\n\
             Amount due (in {}): {:.2}.\n\n\
             Open the app to mark the payment.",
            self.first_name,
            self.sequence_no,
            self.lender,
            self.due_date,
            self.amount.currency,
            self.amount.amount,
        )
    }

    /// SMS body, prefixed when overdue.
    #[must_use]
    pub fn sms_body(&self) -> String {
        let prefix = if self.overdue { "[Overdue] " } else { "" };
        format!(
            "{prefix}Installment {} {} due {}. Amount: {:.2} {}",
            self.sequence_no, self.lender, self.due_date, self.amount.amount, self.amount.currency,
        )
    }
}
