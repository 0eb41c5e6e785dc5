//! Shared types, errors, and configuration for Prestamos.
//!
//! This crate provides common types used across all other crates:
//! - Money and currency types with decimal precision
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - Outbound transports: SMTP mail, SMS and exchange-rate providers

pub mod config;
pub mod email;
pub mod error;
pub mod rates;
pub mod sms;
pub mod types;

pub use config::{AlertsConfig, AppConfig, DatabaseConfig, EmailConfig, RatesConfig, SmsConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use rates::{HttpRateProvider, RateApi, RateFetchError};
pub use sms::{SmsOutcome, SmsService, normalize_phone};
pub use types::{
    AlertId, CreditorId, Currency, HistoryId, InstallmentId, LoanId, Money, PersonaId,
};
