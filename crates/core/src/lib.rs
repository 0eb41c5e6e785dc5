//! Core business logic for Prestamos.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence, mail, SMS and rate providers are reached through traits that the
//! `prestamos-db` crate and the job binary implement.
//!
//! # Modules
//!
//! - `schedule` - Installment schedule generation (flat and French amortization)
//! - `loan` - Loan validation and lifecycle: creation, restructuring, payments
//! - `currency` - Exchange rates, rate caching and conversion
//! - `alerts` - Reminder and overdue notification scheduling
//! - `dashboard` - Per-owner summaries and installment views

pub mod alerts;
pub mod currency;
pub mod dashboard;
pub mod loan;
pub mod schedule;

#[cfg(test)]
mod testing;
