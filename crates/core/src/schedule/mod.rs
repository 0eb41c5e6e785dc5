//! Installment schedule generation.

pub mod engine;
pub mod error;

#[cfg(test)]
mod props;

pub use engine::{
    MONTHLY_RATE_DP, Schedule, ScheduledInstallment, due_date, generate_schedule, monthly_rate,
};
pub use error::ScheduleError;
