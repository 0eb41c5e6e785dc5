//! Installment display rows and dashboard counters.

pub mod summary;
pub mod view;

pub use summary::{DashboardSummary, month_window};
pub use view::InstallmentView;
