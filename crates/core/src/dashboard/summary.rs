//! Dashboard counters.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::loan::Installment;

/// Counts shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Pending installments, overdue included.
    pub pending: usize,
    /// Pending installments due before today.
    pub overdue: usize,
    /// Paid installments whose due date is in the current month.
    pub paid_this_month: usize,
    /// First day of the current month.
    pub month_start: NaiveDate,
    /// Last day of the current month.
    pub month_end: NaiveDate,
}

/// First and last day of the month containing `today`.
#[must_use]
pub fn month_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    (start, end)
}

impl DashboardSummary {
    /// Computes the counters over a set of installments.
    #[must_use]
    pub fn compute<'a>(
        installments: impl IntoIterator<Item = &'a Installment>,
        today: NaiveDate,
    ) -> Self {
        let (month_start, month_end) = month_window(today);
        let mut summary = Self {
            pending: 0,
            overdue: 0,
            paid_this_month: 0,
            month_start,
            month_end,
        };

        for installment in installments {
            if installment.is_paid() {
                if (month_start..=month_end).contains(&installment.due_date) {
                    summary.paid_this_month += 1;
                }
            } else {
                summary.pending += 1;
                if installment.is_overdue(today) {
                    summary.overdue += 1;
                }
            }
        }

        summary
    }
}
